//! The change log: a single slot holding the most recent commit.
//!
//! Every applied commit overwrites the slot; a full data replacement clears it.
//! Nothing is appended, so the log is a "last change" display rather than an
//! audit trail.

use std::fmt;

use controlled_table_core::logging::targets;
use controlled_table_core::{Property, Signal};
use serde::Serialize;

use crate::value::CellValue;

/// Description of one applied commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    /// Position of the edited record in the row store.
    pub row_index: usize,
    /// Id of the edited column.
    pub column_id: String,
    /// Value in the slot before the commit.
    pub old_value: CellValue,
    /// Value in the slot after the commit.
    pub new_value: CellValue,
}

impl ChangeLogEntry {
    /// Returns `true` when the commit wrote back the value it replaced.
    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}

impl fmt::Display for ChangeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row index: {}\nColumn Id: {}\nOld value: {}\nNew value: {}",
            self.row_index, self.column_id, self.old_value, self.new_value
        )
    }
}

/// Host-observable single-slot log.
///
/// Connect to [`ChangeLog::changed`] to hear about every overwrite and clear.
pub struct ChangeLog {
    latest: Property<Option<ChangeLogEntry>>,
    changed: Signal<Option<ChangeLogEntry>>,
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            latest: Property::new(None),
            changed: Signal::new(),
        }
    }

    /// The most recent entry, if any.
    pub fn latest(&self) -> Option<ChangeLogEntry> {
        self.latest.get()
    }

    /// Returns `true` when no commit has been recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.latest.with(Option::is_none)
    }

    /// The latest entry rendered for display.
    pub fn render(&self) -> Option<String> {
        self.latest.with(|entry| entry.as_ref().map(ToString::to_string))
    }

    /// Signal emitted after every overwrite or clear.
    pub fn changed(&self) -> &Signal<Option<ChangeLogEntry>> {
        &self.changed
    }

    /// Overwrites the slot with `entry`.
    ///
    /// Always notifies, even when the entry equals the previous one: two
    /// identical commits are still two commits.
    pub(crate) fn record(&self, entry: ChangeLogEntry) {
        tracing::debug!(
            target: targets::CHANGE_LOG,
            row_index = entry.row_index,
            column_id = %entry.column_id,
            "change log overwritten"
        );
        self.latest.set_silent(Some(entry.clone()));
        self.changed.emit(Some(entry));
    }

    /// Empties the slot. Notifies only if there was something to clear.
    pub(crate) fn clear(&self) {
        if self.latest.set(None) {
            tracing::debug!(target: targets::CHANGE_LOG, "change log cleared");
            self.changed.emit(None);
        }
    }
}

impl fmt::Debug for ChangeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeLog")
            .field("latest", &self.latest.get())
            .finish()
    }
}
