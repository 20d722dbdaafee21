use std::borrow::Cow;

/// Represents a single cell value handed to table sinks.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Double precision floating point number (`TFORM` code `D`, or scaled integers).
    Float64(f64),
    /// Single precision floating point number (`TFORM` code `E`).
    Float32(f32),
    /// Integer widened to 64 bits (`TFORM` codes `B`, `I`, `J`, `K`).
    Int(i64),
    /// FITS logical (`TFORM` code `L`).
    Logical(bool),
    /// UTF-8 string decoded from a character column.
    Str(Cow<'a, str>),
    /// Raw bytes of a character column that did not decode as UTF-8.
    Bytes(Cow<'a, [u8]>),
    /// Missing cell.
    Missing,
}

impl Value<'_> {
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}
