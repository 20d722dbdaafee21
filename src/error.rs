use std::borrow::Cow;
use std::fmt;
use std::io;

/// Result type used across the catalog converter.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error surfaced while reading, transforming or writing a catalog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure while reading the catalog or writing the output.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The file appears to be corrupt or inconsistent while processing a section.
    #[error("corrupted FITS file while processing {section}: {details}")]
    Corrupted {
        section: Section,
        details: Cow<'static, str>,
    },

    /// FITS features the converter does not handle.
    #[error("unsupported FITS feature: {feature}")]
    Unsupported { feature: Cow<'static, str> },

    /// Header keywords could not be interpreted according to expectations.
    #[error("invalid FITS metadata: {details}")]
    InvalidMetadata { details: Cow<'static, str> },

    /// A column named by the caller does not exist in the table.
    #[error("column '{name}' not found in catalog")]
    UnknownColumn { name: String },

    /// A column exists but its type does not support the requested operation.
    #[error("column '{name}' is not a {expected} column")]
    ColumnType {
        name: String,
        expected: &'static str,
    },

    /// A mask sentinel could not be parsed as a number.
    #[error("invalid mask value '{value}'")]
    InvalidMaskValue { value: String },

    /// A missing cell reached the serializer; the table must be filled first.
    #[error("column '{column}' has a missing cell at row {row}")]
    MissingCell { column: String, row: usize },

    /// The build timestamp could not be rendered.
    #[error("cannot format build time: {0}")]
    TimeFormat(#[from] time::error::Format),
}

impl Error {
    pub(crate) fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }
}

/// Logical section of the reader used for diagnostic reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Header { hdu: usize },
    Card { hdu: usize, index: usize },
    Column { index: usize },
    Row { index: u64 },
    Data { hdu: usize },
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header { hdu } => write!(f, "header of HDU {hdu}"),
            Self::Card { hdu, index } => write!(f, "card {index} of HDU {hdu}"),
            Self::Column { index } => write!(f, "column {index}"),
            Self::Row { index } => write!(f, "row {index}"),
            Self::Data { hdu } => write!(f, "data unit of HDU {hdu}"),
        }
    }
}
