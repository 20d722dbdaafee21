use std::str::FromStr;

use crate::error::{Error, Result};
use crate::parser::decode_legacy;
use crate::table::{Column, ColumnData, Table};

/// Rewrites text cells before serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextPolicy {
    /// Leave text untouched.
    #[default]
    None,
    /// Wrap non-missing cells of the named columns in double quotes.
    Quote(Vec<String>),
    /// Trim every text cell and replace inner spaces with `_`.
    Underscore,
}

/// Selector for [`TextPolicy`] without its column list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextMode {
    None,
    #[default]
    Quote,
    Underscore,
}

impl FromStr for TextMode {
    type Err = String;

    fn from_str(mode: &str) -> std::result::Result<Self, Self::Err> {
        match mode.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "quote" => Ok(Self::Quote),
            "underscore" => Ok(Self::Underscore),
            other => Err(format!("unknown text mode '{other}'")),
        }
    }
}

impl TextPolicy {
    /// Builds the policy for `mode`; `columns` is only used by [`TextMode::Quote`].
    #[must_use]
    pub fn from_mode(mode: TextMode, columns: Vec<String>) -> Self {
        match mode {
            TextMode::None => Self::None,
            TextMode::Quote if columns.is_empty() => Self::None,
            TextMode::Quote => Self::Quote(columns),
            TextMode::Underscore => Self::Underscore,
        }
    }

    /// Applies the policy in place.
    ///
    /// # Errors
    ///
    /// With [`TextPolicy::Quote`], returns `UnknownColumn` for a name that is
    /// not in the table and `ColumnType` for a column that does not hold text.
    /// The table is left unchanged when an error is returned.
    pub fn apply(&self, table: &mut Table) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Quote(names) => quote_columns(table, names),
            Self::Underscore => {
                for column in table.columns_mut() {
                    if column.data().is_text() {
                        decode_bytes(column);
                        rewrite_text(column, false, |cell| cell.trim().replace(' ', "_"));
                    }
                }
                Ok(())
            }
        }
    }
}

fn quote_columns(table: &mut Table, names: &[String]) -> Result<()> {
    let mut unique: Vec<&str> = Vec::with_capacity(names.len());
    for name in names {
        let column = table.column(name).ok_or_else(|| Error::unknown_column(name.as_str()))?;
        if !column.data().is_text() {
            return Err(Error::ColumnType {
                name: name.clone(),
                expected: "text",
            });
        }
        if !unique.contains(&name.as_str()) {
            unique.push(name);
        }
    }

    for name in unique {
        if let Some(column) = table.column_mut(name) {
            decode_bytes(column);
            rewrite_text(column, true, |cell| format!("\"{cell}\""));
        }
    }
    Ok(())
}

/// Converts a bytes column to text with the single-byte fallback decoder.
fn decode_bytes(column: &mut Column) {
    if let ColumnData::Bytes(cells) = column.data() {
        let decoded = cells
            .iter()
            .map(|cell| decode_legacy(cell).into_owned())
            .collect();
        column.replace_data(ColumnData::Text(decoded));
    }
}

fn rewrite_text(column: &mut Column, skip_missing: bool, rewrite: impl Fn(&str) -> String) {
    let (data, mask) = column.parts_mut();
    if let ColumnData::Text(cells) = data {
        for (cell, missing) in cells.iter_mut().zip(mask.iter()) {
            if !(skip_missing && *missing) {
                *cell = rewrite(cell);
            }
        }
    }
}
