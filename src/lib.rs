pub mod api;
pub mod error;
pub mod logger;
pub mod metadata;
pub mod numfmt;
pub mod parser;
pub mod pipeline;
pub mod sinks;
pub mod table;
pub mod template;
pub mod transform;
pub mod value;

pub use crate::error::{Error, Result};
pub use api::FitsCatalog;
pub use pipeline::{ConversionReport, ConvertOptions, RenderedCatalog, convert_catalog, render_catalog};
pub use sinks::{FixedWidthSink, RowSink, SinkContext};
pub use table::{Column, ColumnData, Table};
pub use transform::{MaskValues, TextMode, TextPolicy};
