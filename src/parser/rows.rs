use std::borrow::Cow;
use std::io::{ErrorKind, Read};

use super::byteorder::{read_f32, read_f64, read_i16, read_i32, read_i64};
use super::encoding::{decode_utf8, trim_trailing};
use crate::error::{Error, Result, Section};
use crate::metadata::{CatalogMetadata, ColumnDescriptor, FormatCode};
use crate::table::{Column, ColumnData, Table};

/// Upper bound on rows reserved up front, so a corrupt `NAXIS2` cannot force a huge allocation.
const MAX_PREALLOCATED_ROWS: usize = 1 << 20;

#[derive(Debug, Clone, Copy)]
enum IntWidth {
    U8,
    I16,
    I32,
    I64,
}

impl IntWidth {
    const fn from_code(code: FormatCode) -> Option<Self> {
        match code {
            FormatCode::Byte => Some(Self::U8),
            FormatCode::Int16 => Some(Self::I16),
            FormatCode::Int32 => Some(Self::I32),
            FormatCode::Int64 => Some(Self::I64),
            _ => None,
        }
    }

    fn read(self, field: &[u8]) -> i64 {
        match self {
            Self::U8 => i64::from(field[0]),
            Self::I16 => i64::from(read_i16(field)),
            Self::I32 => i64::from(read_i32(field)),
            Self::I64 => read_i64(field),
        }
    }
}

/// Typed accumulator for one column; the variant fixes the decoded output type.
enum Store {
    Logical(Vec<bool>),
    /// Integers, optionally shifted by an integral `TZEROn` (unsigned convention).
    Int {
        width: IntWidth,
        offset: i64,
        values: Vec<i64>,
    },
    /// Integers with a non-trivial `TSCALn`/`TZEROn`, promoted to doubles.
    ScaledInt {
        width: IntWidth,
        scale: f64,
        zero: f64,
        values: Vec<f64>,
    },
    Float32(Vec<f32>),
    /// `D` columns, plus `E` columns that carry scaling keywords.
    Float64 {
        single: bool,
        scale: f64,
        zero: f64,
        values: Vec<f64>,
    },
    Char(Vec<Vec<u8>>),
}

struct ColumnBuilder<'a> {
    descriptor: &'a ColumnDescriptor,
    store: Store,
    mask: Vec<bool>,
}

impl<'a> ColumnBuilder<'a> {
    fn new(descriptor: &'a ColumnDescriptor, capacity: usize) -> Self {
        let code = descriptor.format.code;
        let (scale, zero) = (descriptor.scale, descriptor.zero);
        let store = match (code, IntWidth::from_code(code)) {
            (FormatCode::Logical, _) => Store::Logical(Vec::with_capacity(capacity)),
            (FormatCode::Char, _) => Store::Char(Vec::with_capacity(capacity)),
            (FormatCode::Float32, _) if !descriptor.is_scaled() => {
                Store::Float32(Vec::with_capacity(capacity))
            }
            (_, Some(width)) if !descriptor.is_scaled() => Store::Int {
                width,
                offset: 0,
                values: Vec::with_capacity(capacity),
            },
            (_, Some(width)) => match integral_offset(scale, zero) {
                Some(offset) => Store::Int {
                    width,
                    offset,
                    values: Vec::with_capacity(capacity),
                },
                None => Store::ScaledInt {
                    width,
                    scale,
                    zero,
                    values: Vec::with_capacity(capacity),
                },
            },
            _ => Store::Float64 {
                single: code == FormatCode::Float32,
                scale,
                zero,
                values: Vec::with_capacity(capacity),
            },
        };
        Self {
            descriptor,
            store,
            mask: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn push(&mut self, row: &[u8]) {
        let start = self.descriptor.offset;
        let field = &row[start..start + self.descriptor.format.byte_width()];
        let descriptor = self.descriptor;
        let missing = match &mut self.store {
            Store::Logical(values) => {
                let (value, missing) = match field[0] {
                    b'T' => (true, false),
                    b'F' => (false, false),
                    _ => (false, true),
                };
                values.push(value);
                missing
            }
            Store::Int {
                width,
                offset,
                values,
            } => {
                let raw = width.read(field);
                values.push(raw.saturating_add(*offset));
                descriptor.null == Some(raw)
            }
            Store::ScaledInt {
                width,
                scale,
                zero,
                values,
            } => {
                let raw = width.read(field);
                #[allow(clippy::cast_precision_loss)]
                values.push((raw as f64).mul_add(*scale, *zero));
                descriptor.null == Some(raw)
            }
            Store::Float32(values) => {
                let value = read_f32(field);
                values.push(value);
                value.is_nan()
            }
            Store::Float64 {
                single,
                scale,
                zero,
                values,
            } => {
                let raw = if *single {
                    f64::from(read_f32(field))
                } else {
                    read_f64(field)
                };
                values.push(if descriptor.is_scaled() {
                    raw.mul_add(*scale, *zero)
                } else {
                    raw
                });
                raw.is_nan()
            }
            Store::Char(values) => {
                let trimmed = trim_trailing(field);
                values.push(trimmed.to_vec());
                trimmed.is_empty()
            }
        };
        self.mask.push(missing);
    }

    fn finish(self) -> Result<Column> {
        let data = match self.store {
            Store::Logical(values) => ColumnData::Logical(values),
            Store::Int { values, .. } => ColumnData::Int(values),
            Store::ScaledInt { values, .. } | Store::Float64 { values, .. } => {
                ColumnData::Float64(values)
            }
            Store::Float32(values) => ColumnData::Float32(values),
            Store::Char(values) => char_column(values),
        };
        Column::with_mask(self.descriptor.name.clone(), data, self.mask)
    }
}

/// Returns the integer shift for the unsigned-integer convention (`TSCAL = 1`, integral `TZERO`).
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn integral_offset(scale: f64, zero: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (scale == 1.0 && zero.fract() == 0.0 && zero.abs() < LIMIT).then_some(zero as i64)
}

/// Keeps a character column as text when every cell is UTF-8, otherwise as raw bytes.
fn char_column(values: Vec<Vec<u8>>) -> ColumnData {
    if values.iter().all(|value| decode_utf8(value).is_some()) {
        ColumnData::Text(
            values
                .into_iter()
                .map(|value| String::from_utf8(value).unwrap_or_default())
                .collect(),
        )
    } else {
        ColumnData::Bytes(values)
    }
}

/// Reads every row of the binary table into a column-major [`Table`].
///
/// The reader must be positioned at the first row. NaN floats, `TNULLn`
/// integers, undefined logicals, and blank strings are flagged missing.
///
/// # Errors
///
/// Returns an error if the data unit ends before `NAXIS2` rows were read,
/// or if column names collide.
#[cfg_attr(feature = "hotpath", hotpath::measure)]
pub fn read_table<R: Read>(reader: &mut R, metadata: &CatalogMetadata) -> Result<Table> {
    let capacity = usize::try_from(metadata.row_count)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOCATED_ROWS);
    let mut builders: Vec<ColumnBuilder<'_>> = metadata
        .columns
        .iter()
        .map(|descriptor| ColumnBuilder::new(descriptor, capacity))
        .collect();

    let mut row = vec![0u8; metadata.row_width];
    for index in 0..metadata.row_count {
        read_row(reader, &mut row, index)?;
        for builder in &mut builders {
            builder.push(&row);
        }
    }

    let columns = builders
        .into_iter()
        .map(ColumnBuilder::finish)
        .collect::<Result<Vec<_>>>()?;
    Table::from_columns(columns)
}

fn read_row<R: Read>(reader: &mut R, buf: &mut [u8], index: u64) -> Result<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::Corrupted {
                section: Section::Row { index },
                details: Cow::from("data unit ends before the declared row count"),
            }
        } else {
            err.into()
        }
    })
}
