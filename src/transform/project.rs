use crate::error::{Error, Result};
use crate::table::Table;

/// Drops the named columns, keeping the order of the rest.
///
/// Repeated names are removed once. Every name is checked before anything
/// is removed, so the table is untouched on error.
///
/// # Errors
///
/// Returns `UnknownColumn` for the first name not present in the table.
pub fn exclude_columns<S: AsRef<str>>(table: &mut Table, names: &[S]) -> Result<usize> {
    let mut unique: Vec<&str> = Vec::with_capacity(names.len());
    for name in names.iter().map(AsRef::as_ref) {
        if table.column(name).is_none() {
            return Err(Error::unknown_column(name));
        }
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    for name in &unique {
        table.remove_column(name)?;
    }
    Ok(unique.len())
}
