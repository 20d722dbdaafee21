//! Header template: comment framing, built-in substitutions and `{func(expr)}` placeholders.
//!
//! Placeholders are evaluated against the table as read, before any
//! masking or fill, so statistics describe the original data.

mod aggregate;
mod expr;

use std::fs;
use std::io;
use std::path::Path;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::table::Table;

pub use aggregate::Aggregate;
pub use expr::{BinaryOp, Expr, Number, NumericArray, Operand, Values};

const BUILD_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]");

/// Why a placeholder was left unresolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("missing closing parenthesis")]
    MissingCloseParen,
    #[error("missing opening parenthesis")]
    MissingOpenParen,
    #[error("missing function name")]
    MissingFunction,
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },
    #[error("undefined column '{name}'")]
    UndefinedColumn { name: String },
    #[error("column '{name}' is not numeric")]
    NonNumericColumn { name: String },
    #[error("operands have different lengths ({lhs} and {rhs})")]
    LengthMismatch { lhs: usize, rhs: usize },
    #[error("len() of a scalar")]
    ScalarLen,
    #[error("{function}() of an empty selection")]
    EmptyAggregate { function: &'static str },
    #[error("invalid expression: {details}")]
    Syntax { details: String },
}

/// A placeholder that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// Full placeholder text, braces included.
    pub placeholder: String,
    pub error: TemplateError,
}

/// Outcome of [`resolve_placeholders`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,
    /// Placeholder text and its replacement, in first-seen order.
    pub resolved: Vec<(String, String)>,
    pub unresolved: Vec<Unresolved>,
}

/// Values for the `{file_name}`, `{version}` and `{build_time}` built-ins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    pub file_name: String,
    pub version: String,
    pub build_time: String,
}

impl TemplateContext {
    /// Replaces every built-in placeholder literally.
    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        text.replace("{file_name}", &self.file_name)
            .replace("{version}", &self.version)
            .replace("{build_time}", &self.build_time)
    }
}

/// Formats `when` in UTC as `YYYY-MM-DDTHH:MM:SS.sss`.
///
/// # Errors
///
/// Returns an error if the date cannot be represented in the format.
pub fn format_build_time(when: OffsetDateTime) -> Result<String, time::error::Format> {
    when.to_offset(UtcOffset::UTC).format(BUILD_TIME_FORMAT)
}

/// Prefixes every template line with `# ` and closes the block with a bare `#` line.
///
/// An empty template yields just the closing `#` line.
#[must_use]
pub fn comment_lines(template: &str) -> String {
    let mut header = String::with_capacity(template.len() + template.len() / 16 + 4);
    for line in template.split_inclusive('\n') {
        header.push_str("# ");
        header.push_str(line);
        if !line.ends_with('\n') {
            header.push('\n');
        }
    }
    if !header.ends_with("#\n") {
        header.push_str("#\n");
    }
    header
}

/// Reads a template file and frames it with [`comment_lines`].
///
/// # Errors
///
/// Returns the underlying I/O error; callers treat it as a warning.
pub fn read_header_template(path: &Path) -> io::Result<String> {
    let template = fs::read_to_string(path)?;
    Ok(comment_lines(&template))
}

/// Finds `{...}` spans, each closed by the next `}` on the same line.
#[must_use]
pub fn find_placeholders(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(open) = text[from..].find('{').map(|offset| from + offset) {
        let line_end = text[open..].find('\n').map_or(text.len(), |offset| open + offset);
        match text[open..line_end].find('}') {
            Some(close) => {
                spans.push(&text[open..=open + close]);
                from = open + close + 1;
            }
            None => from = open + 1,
        }
    }
    spans
}

/// Evaluates the inside of one placeholder, e.g. `mean($flux)`.
///
/// # Errors
///
/// Returns the reason the placeholder cannot be resolved.
pub fn evaluate_placeholder(content: &str, table: &Table) -> Result<String, TemplateError> {
    let body = content
        .trim_end()
        .strip_suffix(')')
        .ok_or(TemplateError::MissingCloseParen)?;
    let (name, args) = body.split_once('(').ok_or(TemplateError::MissingOpenParen)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(TemplateError::MissingFunction);
    }
    let aggregate = Aggregate::from_name(name).ok_or_else(|| TemplateError::UnknownFunction {
        name: name.to_owned(),
    })?;
    let expr = Expr::parse(args, |column| table.column(column).is_some())?;
    let value = aggregate.apply(&expr.evaluate(table)?)?;
    Ok(value.format())
}

/// Replaces every resolvable placeholder in `text`; the rest stay verbatim.
#[must_use]
pub fn resolve_placeholders(text: &str, table: &Table) -> Resolution {
    let mut resolved: Vec<(String, String)> = Vec::new();
    let mut unresolved = Vec::new();
    for placeholder in find_placeholders(text) {
        let content = &placeholder[1..placeholder.len() - 1];
        match evaluate_placeholder(content, table) {
            Ok(value) => match resolved.iter_mut().find(|(key, _)| key == placeholder) {
                Some(entry) => entry.1 = value,
                None => resolved.push((placeholder.to_owned(), value)),
            },
            Err(error) => unresolved.push(Unresolved {
                placeholder: placeholder.to_owned(),
                error,
            }),
        }
    }

    let mut output = text.to_owned();
    for (placeholder, value) in &resolved {
        output = output.replace(placeholder.as_str(), value);
    }
    Resolution {
        text: output,
        resolved,
        unresolved,
    }
}
