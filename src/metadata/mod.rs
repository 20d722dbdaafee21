/// High-level metadata for the binary table extension holding the catalog.
#[derive(Debug, Clone)]
pub struct CatalogMetadata {
    /// Zero-based index of the HDU the table was read from.
    pub hdu_index: usize,
    pub extension_name: Option<String>,
    pub row_count: u64,
    /// Width of one row in bytes (`NAXIS1`).
    pub row_width: usize,
    /// Size of the heap following the main table (`PCOUNT`).
    pub heap_size: u64,
    pub columns: Vec<ColumnDescriptor>,
}

impl CatalogMetadata {
    #[must_use]
    pub fn new(hdu_index: usize, column_count: usize) -> Self {
        Self {
            hdu_index,
            extension_name: None,
            row_count: 0,
            row_width: 0,
            heap_size: 0,
            columns: Vec::with_capacity(column_count),
        }
    }

    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Column descriptor assembled from the `T*n` keywords of a binary table.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub index: usize,
    pub name: String,
    pub format: ColumnFormat,
    pub unit: Option<String>,
    pub display: Option<String>,
    /// Integer sentinel flagged missing at read time (`TNULLn`).
    pub null: Option<i64>,
    pub scale: f64,
    pub zero: f64,
    /// Byte offset of the field inside a row.
    pub offset: usize,
}

impl ColumnDescriptor {
    #[must_use]
    pub const fn new(index: usize, name: String, format: ColumnFormat) -> Self {
        Self {
            index,
            name,
            format,
            unit: None,
            display: None,
            null: None,
            scale: 1.0,
            zero: 0.0,
            offset: 0,
        }
    }

    /// Returns true when `TSCALn`/`TZEROn` change the stored values.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_scaled(&self) -> bool {
        self.scale != 1.0 || self.zero != 0.0
    }
}

/// Parsed `TFORMn` value: repeat count and element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    pub repeat: usize,
    pub code: FormatCode,
}

impl ColumnFormat {
    /// Width of the field in bytes.
    #[must_use]
    pub const fn byte_width(&self) -> usize {
        self.repeat * self.code.element_size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCode {
    Logical,
    Byte,
    Int16,
    Int32,
    Int64,
    Char,
    Float32,
    Float64,
}

impl FormatCode {
    #[must_use]
    pub const fn element_size(self) -> usize {
        match self {
            Self::Logical | Self::Byte | Self::Char => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Logical => 'L',
            Self::Byte => 'B',
            Self::Int16 => 'I',
            Self::Int32 => 'J',
            Self::Int64 => 'K',
            Self::Char => 'A',
            Self::Float32 => 'E',
            Self::Float64 => 'D',
        }
    }
}
