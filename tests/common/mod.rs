#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

const BLOCK: usize = 2880;
const CARD: usize = 80;

/// One binary-table column: its `TFORM`, optional extra keywords, and the
/// big-endian bytes of every cell.
pub struct FitsColumn {
    pub name: String,
    pub tform: String,
    pub keywords: Vec<(String, String)>,
    pub cells: Vec<Vec<u8>>,
}

impl FitsColumn {
    pub fn int32(name: &str, values: &[i32]) -> Self {
        Self::raw(name, "1J", values.iter().map(|v| v.to_be_bytes().to_vec()))
    }

    pub fn int16(name: &str, values: &[i16]) -> Self {
        Self::raw(name, "1I", values.iter().map(|v| v.to_be_bytes().to_vec()))
    }

    pub fn float64(name: &str, values: &[f64]) -> Self {
        Self::raw(name, "1D", values.iter().map(|v| v.to_be_bytes().to_vec()))
    }

    pub fn float32(name: &str, values: &[f32]) -> Self {
        Self::raw(name, "1E", values.iter().map(|v| v.to_be_bytes().to_vec()))
    }

    pub fn logical(name: &str, values: &[bool]) -> Self {
        Self::raw(
            name,
            "1L",
            values.iter().map(|v| vec![if *v { b'T' } else { b'F' }]),
        )
    }

    pub fn text(name: &str, width: usize, values: &[&str]) -> Self {
        Self::raw(
            name,
            &format!("{width}A"),
            values.iter().map(|v| {
                let mut cell = v.as_bytes().to_vec();
                cell.resize(width, b' ');
                cell
            }),
        )
    }

    pub fn raw(name: &str, tform: &str, cells: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            name: name.to_owned(),
            tform: tform.to_owned(),
            keywords: Vec::new(),
            cells: cells.into_iter().collect(),
        }
    }

    /// Adds a column keyword such as `TNULL` or `TUNIT`; the column number is appended.
    pub fn with_keyword(mut self, prefix: &str, value: &str) -> Self {
        self.keywords.push((prefix.to_owned(), value.to_owned()));
        self
    }

    fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }
}

pub fn card(keyword: &str, value: &str) -> String {
    format!("{keyword:<8}= {value:>20}")
}

pub fn quoted(text: &str) -> String {
    format!("'{text:<8}'")
}

/// Pads cards to 80 bytes, appends `END`, and pads the header to whole blocks.
pub fn header_block(cards: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    for card in cards.iter().map(String::as_str).chain(["END"]) {
        let mut bytes = card.as_bytes().to_vec();
        bytes.resize(CARD, b' ');
        out.extend_from_slice(&bytes);
    }
    pad(&mut out, b' ');
    out
}

pub fn primary_header() -> Vec<u8> {
    header_block(&[
        card("SIMPLE", "T"),
        card("BITPIX", "8"),
        card("NAXIS", "0"),
        card("EXTEND", "T"),
    ])
}

/// Encodes a single-BINTABLE FITS file.
pub fn bintable(extname: &str, columns: &[FitsColumn]) -> Vec<u8> {
    let rows = columns.first().map_or(0, |column| column.cells.len());
    let row_width: usize = columns.iter().map(FitsColumn::width).sum();

    let mut cards = vec![
        card("XTENSION", &quoted("BINTABLE")),
        card("BITPIX", "8"),
        card("NAXIS", "2"),
        card("NAXIS1", &row_width.to_string()),
        card("NAXIS2", &rows.to_string()),
        card("PCOUNT", "0"),
        card("GCOUNT", "1"),
        card("TFIELDS", &columns.len().to_string()),
        card("EXTNAME", &quoted(extname)),
    ];
    for (index, column) in columns.iter().enumerate() {
        let n = index + 1;
        cards.push(card(&format!("TTYPE{n}"), &quoted(&column.name)));
        cards.push(card(&format!("TFORM{n}"), &quoted(&column.tform)));
        for (prefix, value) in &column.keywords {
            cards.push(card(&format!("{prefix}{n}"), value));
        }
    }

    let mut out = primary_header();
    out.extend(header_block(&cards));
    let mut data = Vec::with_capacity(rows * row_width);
    for row in 0..rows {
        for column in columns {
            data.extend_from_slice(&column.cells[row]);
        }
    }
    pad(&mut data, 0);
    out.extend(data);
    out
}

/// A file whose only extension is an ASCII `TABLE`.
pub fn ascii_table_only() -> Vec<u8> {
    let mut out = primary_header();
    out.extend(header_block(&[
        card("XTENSION", &quoted("TABLE")),
        card("BITPIX", "8"),
        card("NAXIS", "2"),
        card("NAXIS1", "4"),
        card("NAXIS2", "1"),
        card("PCOUNT", "0"),
        card("GCOUNT", "1"),
        card("TFIELDS", "1"),
        card("TTYPE1", &quoted("id")),
        card("TFORM1", &quoted("I4")),
        card("TBCOL1", "1"),
    ]));
    let mut data = b"   1".to_vec();
    pad(&mut data, b' ');
    out.extend(data);
    out
}

pub fn write_fits(dir: &Path, file_name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, bytes).expect("write FITS fixture");
    path
}

/// The catalog used by most conversion tests.
pub fn sample_columns() -> Vec<FitsColumn> {
    vec![
        FitsColumn::int32("id", &[1, 2, 3]),
        FitsColumn::float64("flux", &[10.0, 99.0, 30.0]),
        FitsColumn::float64("ra", &[150.1, 150.2, 150.3]),
        FitsColumn::float64("dec", &[2.1, 2.2, 2.3]),
        FitsColumn::text("name", 12, &["alpha beta", "gamma", ""]),
    ]
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let rem = bytes.len() % BLOCK;
    if rem != 0 {
        bytes.resize(bytes.len() + BLOCK - rem, fill);
    }
}
