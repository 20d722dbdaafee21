//! End-to-end conversion of one FITS catalog into a `.cat` text file.
//!
//! Stage order matters: placeholders see the table as read, then values
//! are masked, text is normalised, missing cells are filled, excluded
//! columns are dropped, and the rest is serialized.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use time::OffsetDateTime;

use crate::api::FitsCatalog;
use crate::error::{Error, Result};
use crate::logger::{log_warn, set_log_prefix};
use crate::sinks::{FixedWidthSink, write_table};
use crate::table::Table;
use crate::template::{
    TemplateContext, Unresolved, format_build_time, read_header_template, resolve_placeholders,
};
use crate::transform::{MaskValues, TextPolicy, apply_mask, exclude_columns, fill_missing};

/// Default value substituted for `{version}`.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Extension of the generated catalog.
pub const OUTPUT_EXTENSION: &str = "cat";

/// Settings for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    header: Option<PathBuf>,
    version: String,
    exclude_columns: Vec<String>,
    mask_values: MaskValues,
    text_policy: TextPolicy,
    out_dir: PathBuf,
    build_time: Option<OffsetDateTime>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: None,
            version: DEFAULT_VERSION.to_owned(),
            exclude_columns: Vec::new(),
            mask_values: MaskValues::default(),
            text_policy: TextPolicy::None,
            out_dir: PathBuf::from("."),
            build_time: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, path: impl Into<PathBuf>) -> Self {
        self.header = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_exclude_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_columns = names.into_iter().map(Into::into).collect();
        self.exclude_columns.retain(|name| !name.is_empty());
        self
    }

    #[must_use]
    pub fn with_mask_values(mut self, values: MaskValues) -> Self {
        self.mask_values = values;
        self
    }

    #[must_use]
    pub fn with_text_policy(mut self, policy: TextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    #[must_use]
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    /// Pins `{build_time}`; the current time is used otherwise.
    #[must_use]
    pub const fn with_build_time(mut self, when: OffsetDateTime) -> Self {
        self.build_time = Some(when);
        self
    }
}

/// Counters describing what each stage did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub output_path: Option<PathBuf>,
    pub rows: usize,
    pub columns: usize,
    pub masked_cells: usize,
    pub filled_cells: usize,
    pub excluded_columns: usize,
    pub resolved_placeholders: usize,
    pub unresolved_placeholders: Vec<Unresolved>,
}

/// Text of a converted catalog plus its report.
#[derive(Debug, Clone)]
pub struct RenderedCatalog {
    pub text: String,
    pub report: ConversionReport,
}

/// Reads `input`, converts it, and writes `<out_dir>/<stem>.cat`.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read, a named column does not
/// exist, or the output cannot be written. An unreadable header template
/// only produces a warning.
pub fn convert_catalog(input: &Path, options: &ConvertOptions) -> Result<ConversionReport> {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidMetadata {
            details: Cow::Owned(format!("input path '{}' has no file name", input.display())),
        })?;
    let _prefix = set_log_prefix(input.display().to_string());

    let table = FitsCatalog::open(input)?.into_table()?;

    let template = options.header.as_deref().map_or_else(String::new, |path| {
        read_header_template(path).unwrap_or_else(|err| {
            log_warn(&format!(
                "cannot read header from file {}: {err}",
                path.display()
            ));
            String::new()
        })
    });
    let build_time = format_build_time(options.build_time.unwrap_or_else(OffsetDateTime::now_utc))?;
    let context = TemplateContext {
        file_name: stem.clone(),
        version: options.version.clone(),
        build_time,
    };
    let header = context.substitute(&template);

    let rendered = render_catalog(table, &header, options)?;
    let output_path = options.out_dir.join(format!("{stem}.{OUTPUT_EXTENSION}"));
    write_atomic(&output_path, rendered.text.as_bytes())?;

    let mut report = rendered.report;
    report.output_path = Some(output_path);
    Ok(report)
}

/// Runs every in-memory stage on `table` and assembles the final text.
///
/// `header` is the comment-framed template with built-ins already
/// substituted; its placeholders are resolved here against `table` before
/// any other stage touches it.
///
/// # Errors
///
/// Returns an error if a quoted or excluded column does not exist or has
/// the wrong type.
#[cfg_attr(feature = "hotpath", hotpath::measure)]
pub fn render_catalog(
    mut table: Table,
    header: &str,
    options: &ConvertOptions,
) -> Result<RenderedCatalog> {
    let resolution = resolve_placeholders(header, &table);
    for unresolved in &resolution.unresolved {
        log_warn(&format!(
            "cannot resolve placeholder {}: {}",
            unresolved.placeholder, unresolved.error
        ));
    }

    let masked_cells = apply_mask(&mut table, &options.mask_values);
    options.text_policy.apply(&mut table)?;
    let filled_cells = fill_missing(&mut table);
    let excluded_columns = exclude_columns(&mut table, &options.exclude_columns)?;

    let body = serialize_table(&table)?;
    let text = compose_output(&resolution.text, &body);

    Ok(RenderedCatalog {
        text,
        report: ConversionReport {
            output_path: None,
            rows: table.row_count(),
            columns: table.column_count(),
            masked_cells,
            filled_cells,
            excluded_columns,
            resolved_placeholders: resolution.resolved.len(),
            unresolved_placeholders: resolution.unresolved,
        },
    })
}

/// Serializes a filled table as fixed-width text, one line per row plus the name line.
///
/// # Errors
///
/// Returns `MissingCell` if the table still has missing cells.
pub fn serialize_table(table: &Table) -> Result<String> {
    let mut sink = FixedWidthSink::new(Vec::new()).with_comment_marker(true);
    write_table(table, &mut sink)?;
    String::from_utf8(sink.into_inner()).map_err(|err| Error::InvalidMetadata {
        details: Cow::Owned(format!("serialized table is not UTF-8: {err}")),
    })
}

/// Joins the header with the serialized table.
///
/// The column-name line becomes the last header line, with its first
/// character replaced by `#`. Data lines follow with no trailing newline.
#[must_use]
pub fn compose_output(header: &str, table_text: &str) -> String {
    let mut lines = table_text.lines();
    let names = lines.next().unwrap_or("");
    let names = names.char_indices().nth(1).map_or("", |(at, _)| &names[at..]);

    let mut output = String::with_capacity(header.len() + table_text.len() + 2);
    output.push_str(header);
    output.push('#');
    output.push_str(names);
    output.push('\n');
    for (index, line) in lines.enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(line);
    }
    output
}

/// Writes through a temporary file in the target directory, then renames it into place.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    file.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}
