use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::table::{ColumnData, Table};

/// Numeric sentinels treated as missing data.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskValues(Vec<f64>);

impl MaskValues {
    #[must_use]
    pub const fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

impl Default for MaskValues {
    fn default() -> Self {
        Self(vec![99.0, -99.0])
    }
}

impl FromStr for MaskValues {
    type Err = Error;

    /// Parses a comma-separated list such as `99,-99`. Blank entries are ignored.
    fn from_str(list: &str) -> Result<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse::<f64>().map_err(|_| Error::InvalidMaskValue {
                    value: item.to_owned(),
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Display for MaskValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Marks every numeric cell equal to one of the sentinels as missing.
///
/// Values are compared in the column's own type: a float32 column matches
/// the single-precision rounding of the sentinel, and integer columns only
/// match integral sentinels. Logical and text columns are never masked.
///
/// Returns the number of cells that became missing.
#[cfg_attr(feature = "hotpath", hotpath::measure)]
#[allow(clippy::float_cmp)]
pub fn apply_mask(table: &mut Table, values: &MaskValues) -> usize {
    let mut newly_masked = 0;
    for &sentinel in values.values() {
        for column in table.columns_mut() {
            let (data, mask) = column.parts_mut();
            newly_masked += match data {
                ColumnData::Float64(cells) => mark(mask, cells, |v| *v == sentinel),
                ColumnData::Float32(cells) => {
                    #[allow(clippy::cast_possible_truncation)]
                    let sentinel = sentinel as f32;
                    mark(mask, cells, |v| *v == sentinel)
                }
                ColumnData::Int(cells) => match integral(sentinel) {
                    Some(sentinel) => mark(mask, cells, |v| *v == sentinel),
                    None => 0,
                },
                ColumnData::Logical(_) | ColumnData::Text(_) | ColumnData::Bytes(_) => 0,
            };
        }
    }
    newly_masked
}

#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn integral(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.fract() == 0.0 && value.abs() < LIMIT).then_some(value as i64)
}

fn mark<T>(mask: &mut [bool], cells: &[T], matches: impl Fn(&T) -> bool) -> usize {
    let mut count = 0;
    for (missing, cell) in mask.iter_mut().zip(cells) {
        if !*missing && matches(cell) {
            *missing = true;
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::value::Value;

    #[test]
    fn parses_comma_separated_values() {
        let values: MaskValues = " 99, -99 ,,1e3".parse().unwrap();
        assert_eq!(values.values(), &[99.0, -99.0, 1000.0]);
        assert_eq!(MaskValues::default().to_string(), "99,-99");
    }

    #[test]
    fn rejects_non_numeric_values() {
        match "99,abc".parse::<MaskValues>() {
            Err(Error::InvalidMaskValue { value }) => assert_eq!(value, "abc"),
            other => panic!("expected InvalidMaskValue, got {other:?}"),
        }
    }

    #[test]
    fn masks_numeric_columns_only() {
        let mut table = Table::from_columns([
            Column::new("id", ColumnData::Int(vec![1, 99, -99])),
            Column::new("flux", ColumnData::Float64(vec![10.0, 99.0, 30.0])),
            Column::new("mag", ColumnData::Float32(vec![99.0, 1.5, 2.5])),
            Column::new("name", ColumnData::Text(vec!["99".into(), "a".into(), "b".into()])),
        ])
        .unwrap();

        let masked = apply_mask(&mut table, &MaskValues::default());
        assert_eq!(masked, 4);
        assert_eq!(table.column("id").unwrap().missing_count(), 2);
        assert!(table.column("flux").unwrap().is_missing(1));
        assert!(table.column("mag").unwrap().is_missing(0));
        assert_eq!(table.column("name").unwrap().value(0), Value::Str("99".into()));
    }

    #[test]
    fn masking_is_idempotent() {
        let mut table =
            Table::from_columns([Column::new("x", ColumnData::Float64(vec![99.0, 1.0]))]).unwrap();
        let values: MaskValues = "99,99".parse().unwrap();
        assert_eq!(apply_mask(&mut table, &values), 1);
        assert_eq!(apply_mask(&mut table, &values), 0);
    }

    #[test]
    fn fractional_sentinels_skip_integer_columns() {
        let mut table =
            Table::from_columns([Column::new("n", ColumnData::Int(vec![0, 1]))]).unwrap();
        assert_eq!(apply_mask(&mut table, &MaskValues::new(vec![0.5])), 0);
    }
}
