use std::borrow::Cow;

use super::header::Header;
use crate::error::{Error, Result, Section};
use crate::metadata::{ColumnDescriptor, ColumnFormat, FormatCode};

/// Parses a binary-table `TFORMn` value such as `1J`, `E` or `20A`.
///
/// # Errors
///
/// Returns `Unsupported` for array, bit, complex, and variable-length
/// descriptors, and `InvalidMetadata` for malformed values.
pub fn parse_tform(tform: &str, column: usize) -> Result<ColumnFormat> {
    let tform = tform.trim();
    let digits = tform.bytes().take_while(u8::is_ascii_digit).count();
    let repeat = if digits == 0 {
        1
    } else {
        tform[..digits]
            .parse::<usize>()
            .map_err(|_| invalid_tform(tform, column))?
    };
    let letter = tform[digits..]
        .chars()
        .next()
        .ok_or_else(|| invalid_tform(tform, column))?;

    let code = match letter {
        'L' => FormatCode::Logical,
        'B' => FormatCode::Byte,
        'I' => FormatCode::Int16,
        'J' => FormatCode::Int32,
        'K' => FormatCode::Int64,
        'A' => FormatCode::Char,
        'E' => FormatCode::Float32,
        'D' => FormatCode::Float64,
        'X' => return Err(unsupported(column, "bit array")),
        'C' | 'M' => return Err(unsupported(column, "complex")),
        'P' | 'Q' => return Err(unsupported(column, "variable-length array")),
        _ => return Err(invalid_tform(tform, column)),
    };

    if repeat == 0 {
        return Err(unsupported(column, "zero-width"));
    }
    if repeat > 1 && code != FormatCode::Char {
        return Err(unsupported(column, "multi-element"));
    }
    Ok(ColumnFormat { repeat, code })
}

/// Builds descriptors for `TFIELDS` columns, assigning byte offsets in declaration order.
///
/// # Errors
///
/// Returns an error if a `TFORMn` keyword is missing or unsupported, or if
/// the field widths do not add up to `NAXIS1`.
pub fn read_column_descriptors(header: &Header, row_width: usize) -> Result<Vec<ColumnDescriptor>> {
    let tfields = usize::try_from(header.required_count("TFIELDS")?).map_err(|_| {
        Error::InvalidMetadata {
            details: Cow::from("TFIELDS exceeds addressable range"),
        }
    })?;

    let mut columns = Vec::with_capacity(tfields);
    let mut offset = 0usize;
    for n in 1..=tfields {
        let index = n - 1;
        let tform = header
            .string(&format!("TFORM{n}"))
            .ok_or_else(|| Error::InvalidMetadata {
                details: Cow::Owned(format!("missing TFORM{n} keyword")),
            })?;
        let format = parse_tform(tform, index)?;

        let name = header
            .string(&format!("TTYPE{n}"))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| format!("col{n}"), str::to_owned);

        let mut column = ColumnDescriptor::new(index, name, format);
        column.unit = header.string(&format!("TUNIT{n}")).map(str::to_owned);
        column.display = header.string(&format!("TDISP{n}")).map(str::to_owned);
        column.null = header.integer(&format!("TNULL{n}"));
        column.scale = header.float(&format!("TSCAL{n}")).unwrap_or(1.0);
        column.zero = header.float(&format!("TZERO{n}")).unwrap_or(0.0);
        column.offset = offset;
        offset = offset
            .checked_add(format.byte_width())
            .ok_or_else(|| Error::Corrupted {
                section: Section::Column { index },
                details: Cow::from("column widths overflow the row size"),
            })?;
        columns.push(column);
    }

    if offset != row_width {
        return Err(Error::Corrupted {
            section: Section::Header { hdu: header.hdu },
            details: Cow::Owned(format!(
                "column widths sum to {offset} bytes but NAXIS1 is {row_width}"
            )),
        });
    }
    Ok(columns)
}

fn invalid_tform(tform: &str, column: usize) -> Error {
    Error::InvalidMetadata {
        details: Cow::Owned(format!("invalid TFORM '{tform}' for column {column}")),
    }
}

fn unsupported(column: usize, kind: &str) -> Error {
    Error::Unsupported {
        feature: Cow::Owned(format!("{kind} column (column {column})")),
    }
}
