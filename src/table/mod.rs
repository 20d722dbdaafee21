//! Column-major in-memory table with a per-cell missing mask.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::value::Value;

/// Typed storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float64(Vec<f64>),
    Float32(Vec<f32>),
    Int(Vec<i64>),
    Logical(Vec<bool>),
    Text(Vec<String>),
    /// Character data that was not valid UTF-8; decoded lazily by the text policies.
    Bytes(Vec<Vec<u8>>),
}

impl ColumnData {
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Float64(values) => values.len(),
            Self::Float32(values) => values.len(),
            Self::Int(values) => values.len(),
            Self::Logical(values) => values.len(),
            Self::Text(values) => values.len(),
            Self::Bytes(values) => values.len(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Bytes(_))
    }
}

/// A named column plus its missing mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
    mask: Vec<bool>,
}

impl Column {
    /// Builds a column with no missing cells.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        let mask = vec![false; data.len()];
        Self {
            name: name.into(),
            data,
            mask,
        }
    }

    /// Builds a column with an explicit missing mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the mask length differs from the data length.
    pub fn with_mask(name: impl Into<String>, data: ColumnData, mask: Vec<bool>) -> Result<Self> {
        let name = name.into();
        if mask.len() != data.len() {
            return Err(Error::InvalidMetadata {
                details: Cow::Owned(format!(
                    "mask length {} does not match {} values in column '{name}'",
                    mask.len(),
                    data.len()
                )),
            });
        }
        Ok(Self { name, data, mask })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Gives simultaneous access to the values and the mask.
    pub fn parts_mut(&mut self) -> (&mut ColumnData, &mut [bool]) {
        (&mut self.data, &mut self.mask)
    }

    /// Swaps the storage while keeping the mask; the replacement must have the same length.
    pub(crate) fn replace_data(&mut self, data: ColumnData) {
        debug_assert_eq!(data.len(), self.mask.len());
        self.data = data;
    }

    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn is_missing(&self, row: usize) -> bool {
        self.mask.get(row).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.mask.iter().filter(|missing| **missing).count()
    }

    /// Returns the cell at `row`, or `Value::Missing` when it is masked or out of range.
    #[must_use]
    pub fn value(&self, row: usize) -> Value<'_> {
        if self.is_missing(row) {
            return Value::Missing;
        }
        let value = match &self.data {
            ColumnData::Float64(values) => values.get(row).copied().map(Value::Float64),
            ColumnData::Float32(values) => values.get(row).copied().map(Value::Float32),
            ColumnData::Int(values) => values.get(row).copied().map(Value::Int),
            ColumnData::Logical(values) => values.get(row).copied().map(Value::Logical),
            ColumnData::Text(values) => values.get(row).map(|s| Value::Str(Cow::Borrowed(s))),
            ColumnData::Bytes(values) => values.get(row).map(|b| Value::Bytes(Cow::Borrowed(b))),
        };
        value.unwrap_or(Value::Missing)
    }
}

/// Ordered collection of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Builds a table from columns, checking names and lengths.
    ///
    /// # Errors
    ///
    /// Returns an error if two columns share a name or their lengths differ.
    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Result<Self> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Appends a column to the right of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken or the length differs
    /// from the existing columns.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(column.name()).is_some() {
            return Err(Error::InvalidMetadata {
                details: Cow::Owned(format!("duplicate column name '{}'", column.name())),
            });
        }
        if let Some(first) = self.columns.first()
            && first.len() != column.len()
        {
            return Err(Error::InvalidMetadata {
                details: Cow::Owned(format!(
                    "column '{}' has {} rows but the table has {}",
                    column.name(),
                    column.len(),
                    first.len()
                )),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.name == name)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Removes and returns the named column.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownColumn` if no column has that name.
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let index = self
            .columns
            .iter()
            .position(|column| column.name == name)
            .ok_or_else(|| Error::unknown_column(name))?;
        Ok(self.columns.remove(index))
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns one row as borrowed cell values.
    #[must_use]
    pub fn row(&self, index: usize) -> Vec<Value<'_>> {
        self.columns.iter().map(|column| column.value(index)).collect()
    }

    #[must_use]
    pub fn has_missing(&self) -> bool {
        self.columns
            .iter()
            .any(|column| column.mask.iter().any(|missing| *missing))
    }
}
