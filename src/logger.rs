//! Diagnostics for the converter: stderr plus an optional append-only log file.

use std::cell::RefCell;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Result as IoResult, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

static LOG_FILE: OnceLock<Arc<Mutex<File>>> = OnceLock::new();
thread_local! {
    static CATALOG: RefCell<Option<String>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

fn render(level: Level, message: &str) -> String {
    CATALOG.with(|catalog| match catalog.borrow().as_deref() {
        Some(name) => format!("{level}: {name}: {message}"),
        None => format!("{level}: {message}"),
    })
}

/// Appends warnings and errors to `path` as well as stderr.
///
/// Only the first call installs a file; later calls still create their file
/// but messages keep going to the first one.
///
/// # Errors
///
/// Returns an error if the log file or its directory cannot be created.
pub fn set_log_file(path: &Path) -> IoResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = LOG_FILE.set(Arc::new(Mutex::new(file)));
    Ok(())
}

/// Tags messages on this thread with the catalog being converted until the
/// guard is dropped.
pub fn set_log_prefix(catalog: impl Into<String>) -> LogPrefixGuard {
    let previous = CATALOG.with(|slot| slot.replace(Some(catalog.into())));
    LogPrefixGuard { previous }
}

#[must_use = "the prefix is cleared when the guard is dropped"]
pub struct LogPrefixGuard {
    previous: Option<String>,
}

impl Drop for LogPrefixGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CATALOG.with(|slot| slot.replace(previous));
    }
}

fn emit(level: Level, message: &str) {
    let line = render(level, message);
    eprintln!("{line}");
    if let Some(writer) = LOG_FILE.get()
        && let Ok(mut file) = writer.lock()
    {
        let _ = writeln!(file, "{line}");
    }
}

pub fn log_warn(message: &str) {
    emit(Level::Warning, message);
}

pub fn log_error(message: &str) {
    emit(Level::Error, message);
}
