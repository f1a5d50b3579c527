//! The record contract.
//!
//! A record is a fixed-shape set of named scalar fields. The row store never
//! looks inside a record except through this trait, and only the commit
//! protocol writes to one.

use crate::value::CellValue;

/// A row type that can live in a [`RowStore`](crate::RowStore).
///
/// Records are identified by their position in the store; no persistent id is
/// required. `Clone` is needed because a commit replaces the edited record with
/// an updated copy instead of mutating the shared one.
///
/// # Example
///
/// ```
/// use controlled_table::{CellValue, Record};
///
/// #[derive(Clone)]
/// struct Pair {
///     key: CellValue,
///     value: CellValue,
/// }
///
/// impl Record for Pair {
///     fn field_names() -> &'static [&'static str] {
///         &["key", "value"]
///     }
///
///     fn field(&self, name: &str) -> Option<CellValue> {
///         match name {
///             "key" => Some(self.key.clone()),
///             "value" => Some(self.value.clone()),
///             _ => None,
///         }
///     }
///
///     fn set_field(&mut self, name: &str, value: CellValue) -> bool {
///         match name {
///             "key" => self.key = value,
///             "value" => self.value = value,
///             _ => return false,
///         }
///         true
///     }
/// }
/// ```
pub trait Record: Clone + Send + Sync + 'static {
    /// Names of every field, in declaration order.
    fn field_names() -> &'static [&'static str];

    /// Reads a field by name. Returns `None` for unknown names.
    fn field(&self, name: &str) -> Option<CellValue>;

    /// Writes a field by name. Returns `false` (leaving the record untouched)
    /// for unknown names.
    fn set_field(&mut self, name: &str, value: CellValue) -> bool;

    /// Returns `true` if `name` is one of [`Record::field_names`].
    fn has_field(name: &str) -> bool {
        Self::field_names().contains(&name)
    }
}
