use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};

use super::column::read_column_descriptors;
use super::header::{Header, padded_len, read_header};
use crate::error::{Error, Result, Section};
use crate::metadata::CatalogMetadata;

/// Upper bound on `NAXIS1`; one row buffer of this size is allocated.
pub const MAX_ROW_WIDTH: usize = 1 << 26;

#[derive(Debug)]
pub struct ParsedMetadata {
    pub metadata: CatalogMetadata,
    /// Absolute byte offset where the table rows start.
    pub data_offset: u64,
}

/// Locates the first `BINTABLE` extension and decodes its column layout.
///
/// Leaves the reader positioned at the first row of the table.
///
/// # Errors
///
/// Returns an error if the primary header is not FITS, no binary table
/// exists, or the table header is inconsistent.
pub fn parse_metadata<R: Read + Seek>(reader: &mut R) -> Result<ParsedMetadata> {
    let primary = read_header(reader, 0)?.ok_or_else(|| Error::Corrupted {
        section: Section::Header { hdu: 0 },
        details: Cow::from("file is empty"),
    })?;
    if primary.logical("SIMPLE") != Some(true) {
        return Err(Error::InvalidMetadata {
            details: Cow::from("primary header does not start with SIMPLE = T"),
        });
    }
    skip_data(reader, &primary)?;

    let mut saw_ascii_table = false;
    for hdu in 1.. {
        let Some(header) = read_header(reader, hdu)? else {
            break;
        };
        match header.string("XTENSION").map(str::trim_end) {
            Some("BINTABLE") => {
                let data_offset = reader.stream_position()?;
                let metadata = table_metadata(&header)?;
                return Ok(ParsedMetadata {
                    metadata,
                    data_offset,
                });
            }
            Some("TABLE") => saw_ascii_table = true,
            _ => {}
        }
        skip_data(reader, &header)?;
    }

    if saw_ascii_table {
        return Err(Error::Unsupported {
            feature: Cow::from("ASCII TABLE extensions"),
        });
    }
    Err(Error::InvalidMetadata {
        details: Cow::from("no BINTABLE extension found"),
    })
}

fn skip_data<R: Seek>(reader: &mut R, header: &Header) -> Result<()> {
    let len = padded_len(header.data_len()?);
    let len = i64::try_from(len).map_err(|_| Error::Corrupted {
        section: Section::Data { hdu: header.hdu },
        details: Cow::from("data unit too large to skip"),
    })?;
    reader.seek(SeekFrom::Current(len))?;
    Ok(())
}

fn table_metadata(header: &Header) -> Result<CatalogMetadata> {
    let corrupted = |details: String| Error::Corrupted {
        section: Section::Header { hdu: header.hdu },
        details: Cow::Owned(details),
    };

    let bitpix = header.integer("BITPIX");
    if bitpix != Some(8) {
        return Err(corrupted(format!(
            "BINTABLE requires BITPIX = 8 (found {bitpix:?})"
        )));
    }
    let naxis = header.required_count("NAXIS")?;
    if naxis != 2 {
        return Err(corrupted(format!("BINTABLE requires NAXIS = 2 (found {naxis})")));
    }

    let row_width = usize::try_from(header.required_count("NAXIS1")?)
        .ok()
        .filter(|width| *width <= MAX_ROW_WIDTH)
        .ok_or_else(|| corrupted(format!("NAXIS1 exceeds {MAX_ROW_WIDTH} bytes")))?;
    let columns = read_column_descriptors(header, row_width)?;

    let mut metadata = CatalogMetadata::new(header.hdu, columns.len());
    metadata.extension_name = header.string("EXTNAME").map(|name| name.trim().to_owned());
    metadata.row_count = header.required_count("NAXIS2")?;
    metadata.row_width = row_width;
    metadata.heap_size = header.integer("PCOUNT").and_then(|n| u64::try_from(n).ok()).unwrap_or(0);
    metadata.columns = columns;
    Ok(metadata)
}
