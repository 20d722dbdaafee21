use std::borrow::Cow;
use std::io::Write;

use crate::error::{Error, Result};
use crate::numfmt::{format_bool, format_f32, format_f64, format_i64};
use crate::parser::decode_legacy;
use crate::sinks::{RowSink, SinkContext};
use crate::value::Value;

const DELIMITER: &str = "  ";

/// Writes rows as whitespace-aligned text columns.
///
/// Column widths depend on every value, so rows are buffered until
/// [`RowSink::finish`]. Cells are right-justified and joined by two
/// spaces; the first line holds the column names.
pub struct FixedWidthSink<W: Write> {
    output: W,
    comment_marker: bool,
    names: Vec<String>,
    widths: Vec<usize>,
    rows: Vec<Vec<String>>,
    started: bool,
}

impl<W: Write> FixedWidthSink<W> {
    #[must_use]
    pub fn new(output: W) -> Self {
        Self {
            output,
            comment_marker: false,
            names: Vec::new(),
            widths: Vec::new(),
            rows: Vec::new(),
            started: false,
        }
    }

    /// Pads the first column by one character so the header line can start with a comment marker.
    #[must_use]
    pub const fn with_comment_marker(mut self, reserve: bool) -> Self {
        self.comment_marker = reserve;
        self
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn render(value: &Value<'_>) -> Option<String> {
        match value {
            Value::Float64(v) => Some(format_f64(*v)),
            Value::Float32(v) => Some(format_f32(*v)),
            Value::Int(v) => Some(format_i64(*v)),
            Value::Logical(v) => Some(format_bool(*v).to_owned()),
            Value::Str(s) => Some(s.as_ref().to_owned()),
            Value::Bytes(bytes) => Some(decode_legacy(bytes).into_owned()),
            Value::Missing => None,
        }
    }

    fn write_line(&mut self, cells: &[String]) -> Result<()> {
        let mut line = String::new();
        for (index, (cell, width)) in cells.iter().zip(&self.widths).enumerate() {
            if index > 0 {
                line.push_str(DELIMITER);
            }
            let width = if index == 0 && self.comment_marker {
                width + 1
            } else {
                *width
            };
            let pad = width.saturating_sub(cell.chars().count());
            line.extend(std::iter::repeat_n(' ', pad));
            line.push_str(cell);
        }
        line.push('\n');
        self.output.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl<W: Write> RowSink for FixedWidthSink<W> {
    fn begin(&mut self, context: SinkContext<'_>) -> Result<()> {
        if self.started {
            return Err(Error::Unsupported {
                feature: Cow::from("fixed-width sink cannot be reused"),
            });
        }
        self.started = true;
        self.names = context.column_names().map(str::to_owned).collect();
        self.widths = self.names.iter().map(|name| name.chars().count()).collect();
        self.rows = Vec::with_capacity(context.row_count);
        Ok(())
    }

    fn write_row(&mut self, row: &[Value<'_>]) -> Result<()> {
        if row.len() != self.names.len() {
            return Err(Error::InvalidMetadata {
                details: Cow::Owned(format!(
                    "row has {} cells but the table has {} columns",
                    row.len(),
                    self.names.len()
                )),
            });
        }
        let mut cells = Vec::with_capacity(row.len());
        for (index, value) in row.iter().enumerate() {
            let text = Self::render(value).ok_or_else(|| Error::MissingCell {
                column: self.names[index].clone(),
                row: self.rows.len(),
            })?;
            let width = text.chars().count();
            if width > self.widths[index] {
                self.widths[index] = width;
            }
            cells.push(text);
        }
        self.rows.push(cells);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let names = std::mem::take(&mut self.names);
        self.write_line(&names)?;
        let rows = std::mem::take(&mut self.rows);
        for row in &rows {
            self.write_line(row)?;
        }
        self.names = names;
        self.output.flush()?;
        Ok(())
    }
}
