//! In-place table stages run between reading and serialization.

mod fill;
mod mask;
mod normalize;
mod project;

pub use fill::{FILL_VALUE, fill_missing};
pub use mask::{MaskValues, apply_mask};
pub use normalize::{TextMode, TextPolicy};
pub use project::exclude_columns;

/// Splits a comma-separated column list, dropping blank entries.
#[must_use]
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
