mod fixed_width;

use crate::error::Result;
use crate::table::{Column, Table};
use crate::value::Value;

pub use fixed_width::FixedWidthSink;

/// Provides table-level information to sinks during initialisation.
pub struct SinkContext<'a> {
    pub columns: &'a [Column],
    pub row_count: usize,
}

impl<'a> SinkContext<'a> {
    #[must_use]
    pub fn new(table: &'a Table) -> Self {
        Self {
            columns: table.columns(),
            row_count: table.row_count(),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.columns.iter().map(Column::name)
    }
}

/// Trait implemented by sinks that consume table rows.
pub trait RowSink {
    /// Called before any rows are written to allow the sink to initialise internal state.
    fn begin(&mut self, context: SinkContext<'_>) -> Result<()>;

    /// Invoked for every row of the table, in order.
    fn write_row(&mut self, row: &[Value<'_>]) -> Result<()>;

    /// Called once all rows have been forwarded to the sink.
    fn finish(&mut self) -> Result<()>;
}

/// Streams every row of `table` through `sink`.
///
/// # Errors
///
/// Propagates the first error reported by the sink.
pub fn write_table<S: RowSink + ?Sized>(table: &Table, sink: &mut S) -> Result<()> {
    sink.begin(SinkContext::new(table))?;
    for index in 0..table.row_count() {
        let row = table.row(index);
        sink.write_row(&row)?;
    }
    sink.finish()
}
