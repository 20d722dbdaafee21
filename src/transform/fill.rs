use crate::table::{ColumnData, Table};

/// Sentinel written into every missing cell.
pub const FILL_VALUE: i64 = -99;

/// Replaces every missing cell with [`FILL_VALUE`] in the column's own type
/// and clears the masks. Logical cells take `true`, the truth value of a
/// non-zero fill.
///
/// Returns the number of cells filled.
#[cfg_attr(feature = "hotpath", hotpath::measure)]
pub fn fill_missing(table: &mut Table) -> usize {
    let mut filled = 0;
    for column in table.columns_mut() {
        let (data, mask) = column.parts_mut();
        filled += match data {
            #[allow(clippy::cast_precision_loss)]
            ColumnData::Float64(cells) => fill(cells, mask, || FILL_VALUE as f64),
            #[allow(clippy::cast_precision_loss)]
            ColumnData::Float32(cells) => fill(cells, mask, || FILL_VALUE as f32),
            ColumnData::Int(cells) => fill(cells, mask, || FILL_VALUE),
            ColumnData::Logical(cells) => fill(cells, mask, || FILL_VALUE != 0),
            ColumnData::Text(cells) => fill(cells, mask, || FILL_VALUE.to_string()),
            ColumnData::Bytes(cells) => fill(cells, mask, || FILL_VALUE.to_string().into_bytes()),
        };
    }
    filled
}

fn fill<T>(cells: &mut [T], mask: &mut [bool], value: impl Fn() -> T) -> usize {
    let mut count = 0;
    for (cell, missing) in cells.iter_mut().zip(mask.iter_mut()) {
        if *missing {
            *cell = value();
            *missing = false;
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
    fn fills_each_type_with_its_own_sentinel() {
        let mask = vec![true, false];
        let mut table = Table::from_columns([
            Column::with_mask("f", ColumnData::Float64(vec![99.0, 1.0]), mask.clone()).unwrap(),
            Column::with_mask("i", ColumnData::Int(vec![0, 1]), mask.clone()).unwrap(),
            Column::with_mask("b", ColumnData::Logical(vec![false, false]), mask.clone()).unwrap(),
            Column::with_mask("s", ColumnData::Text(vec![String::new(), "x".into()]), mask)
                .unwrap(),
        ])
        .unwrap();

        assert_eq!(fill_missing(&mut table), 4);
        assert!(!table.has_missing());
        assert_eq!(
            table.row(0),
            vec![
                Value::Float64(-99.0),
                Value::Int(-99),
                Value::Logical(true),
                Value::Str("-99".into()),
            ]
        );
        assert_eq!(table.row(1)[0], Value::Float64(1.0));
    }
}
