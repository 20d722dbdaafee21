mod common;

use std::io::Cursor;

use common::{FitsColumn, ascii_table_only, bintable, card, header_block, primary_header};
use fits2cat::metadata::FormatCode;
use fits2cat::value::Value;
use fits2cat::{ColumnData, Error, FitsCatalog};

#[test]
fn metadata_describes_first_bintable() {
    let bytes = bintable("OBJECTS", &common::sample_columns());
    let catalog = FitsCatalog::from_reader(Cursor::new(bytes)).expect("open catalog");
    let meta = catalog.metadata();

    assert_eq!(meta.hdu_index, 1);
    assert_eq!(meta.extension_name.as_deref(), Some("OBJECTS"));
    assert_eq!(meta.row_count, 3);
    assert_eq!(meta.row_width, 4 + 8 + 8 + 8 + 12);
    let names: Vec<_> = meta.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "flux", "ra", "dec", "name"]);
    assert_eq!(meta.columns[0].format.code, FormatCode::Int32);
    assert_eq!(meta.columns[4].format.code, FormatCode::Char);
    assert_eq!(meta.columns[4].offset, 28);
}

#[test]
fn reads_typed_columns_with_read_time_masks() {
    let columns = vec![
        FitsColumn::int32("id", &[5, -999]).with_keyword("TNULL", "-999"),
        FitsColumn::float32("mag", &[1.5, f32::NAN]),
        FitsColumn::raw("ok", "1L", [vec![b'T'], vec![0]]),
        FitsColumn::text("label", 4, &["ab", ""]),
    ];
    let table = FitsCatalog::from_reader(Cursor::new(bintable("T", &columns)))
        .and_then(FitsCatalog::into_table)
        .expect("read table");

    assert_eq!(table.row_count(), 2);
    let id = table.column("id").unwrap();
    assert_eq!(id.value(0), Value::Int(5));
    assert!(id.is_missing(1));
    assert!(table.column("mag").unwrap().is_missing(1));
    assert_eq!(table.column("ok").unwrap().value(0), Value::Logical(true));
    assert!(table.column("ok").unwrap().is_missing(1));
    let label = table.column("label").unwrap();
    assert!(matches!(label.data(), ColumnData::Text(_)));
    assert!(label.is_missing(1));
}

#[test]
fn unsigned_offset_keeps_integers() {
    let columns = vec![
        FitsColumn::int16("count", &[i16::MIN, -32_767]).with_keyword("TZERO", "32768"),
    ];
    let table = FitsCatalog::from_reader(Cursor::new(bintable("T", &columns)))
        .and_then(FitsCatalog::into_table)
        .expect("read table");
    assert_eq!(
        table.column("count").unwrap().data(),
        &ColumnData::Int(vec![0, 1])
    );
}

#[test]
fn table_can_be_read_twice() {
    let mut catalog =
        FitsCatalog::from_reader(Cursor::new(bintable("T", &common::sample_columns()))).unwrap();
    let first = catalog.read_table().unwrap();
    let second = catalog.read_table().unwrap();
    assert_eq!(first, second);
}

#[test]
fn ascii_table_is_unsupported() {
    let result = FitsCatalog::from_reader(Cursor::new(ascii_table_only()));
    assert!(matches!(result, Err(Error::Unsupported { .. })));
}

#[test]
fn file_without_extensions_has_no_bintable() {
    match FitsCatalog::from_reader(Cursor::new(primary_header())) {
        Err(Error::InvalidMetadata { details }) => {
            assert!(details.contains("no BINTABLE"), "{details}");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[test]
fn non_fits_primary_header_is_rejected() {
    let bytes = header_block(&[card("BITPIX", "8"), card("NAXIS", "0")]);
    assert!(matches!(
        FitsCatalog::from_reader(Cursor::new(bytes)),
        Err(Error::InvalidMetadata { .. })
    ));
}

#[test]
fn truncated_data_is_corrupted() {
    let mut bytes = bintable("T", &common::sample_columns());
    bytes.truncate(bytes.len() - 2880);
    let result = FitsCatalog::from_reader(Cursor::new(bytes)).and_then(FitsCatalog::into_table);
    assert!(matches!(result, Err(Error::Corrupted { .. })));
}

#[test]
fn oversized_rows_are_corrupted() {
    let width = fits2cat::parser::MAX_ROW_WIDTH + 1;
    let mut bytes = primary_header();
    bytes.extend(header_block(&[
        card("XTENSION", &common::quoted("BINTABLE")),
        card("BITPIX", "8"),
        card("NAXIS", "2"),
        card("NAXIS1", &width.to_string()),
        card("NAXIS2", "1"),
        card("PCOUNT", "0"),
        card("GCOUNT", "1"),
        card("TFIELDS", "1"),
        card("TFORM1", &common::quoted(&format!("{width}A"))),
    ]));
    assert!(matches!(
        FitsCatalog::from_reader(Cursor::new(bytes)),
        Err(Error::Corrupted { .. })
    ));
}
