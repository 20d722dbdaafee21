use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;
use crate::metadata::CatalogMetadata;
use crate::parser::{ParsedMetadata, parse_metadata, read_table};
use crate::table::Table;

/// A FITS file whose first binary table has been located and described.
pub struct FitsCatalog<R: Read + Seek> {
    reader: R,
    parsed: ParsedMetadata,
}

impl FitsCatalog<BufReader<File>> {
    /// Opens a FITS catalog from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or if no usable binary
    /// table can be found.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> FitsCatalog<R> {
    /// Builds a catalog from any `Read + Seek` implementor.
    ///
    /// # Errors
    ///
    /// Returns an error if header parsing fails.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let parsed = parse_metadata(&mut reader)?;
        Ok(Self { reader, parsed })
    }

    #[must_use]
    pub const fn metadata(&self) -> &CatalogMetadata {
        &self.parsed.metadata
    }

    /// Decodes all rows into memory. Can be called repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if the data unit is truncated or cannot be read.
    pub fn read_table(&mut self) -> Result<Table> {
        self.reader.seek(SeekFrom::Start(self.parsed.data_offset))?;
        read_table(&mut self.reader, &self.parsed.metadata)
    }

    /// Decodes all rows and releases the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the data unit is truncated or cannot be read.
    pub fn into_table(mut self) -> Result<Table> {
        self.read_table()
    }
}
