//! The row store and its mutation protocol.
//!
//! A [`RowStore`] owns an ordered sequence of records behind an `Arc`. Every
//! write replaces the whole sequence: [`RowStore::commit`] swaps in a copy in
//! which exactly one record is new and every other element is the same `Arc`
//! as before, and [`RowStore::regenerate`] swaps in an entirely fresh sequence
//! under a new generation number.
//!
//! Readers take a [`RowStore::snapshot`] and keep working against it; a commit
//! never mutates a sequence somebody else may be holding.
//!
//! # Signals
//!
//! - `data_changed(row_index, column_id)`: after every applied commit
//! - `reset(generation)`: after every full replacement

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use controlled_table_core::logging::{span_names, targets};
use controlled_table_core::{PerfSpan, Property, Signal};

use crate::change_log::{ChangeLog, ChangeLogEntry};
use crate::column::ColumnSchema;
use crate::generator::{DataGenerator, make_data};
use crate::record::Record;
use crate::value::CellValue;

/// An immutable view of the store's records at one point in time.
pub type Rows<R> = Arc<Vec<Arc<R>>>;

/// Why a commit left the store untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The row index does not exist in the current sequence, typically a stale
    /// reference into a sequence that has since been replaced.
    RowOutOfRange { row_index: usize, len: usize },
    /// No column with this id exists in the schema.
    UnknownColumn { column_id: String },
    /// The column exists but is not editable.
    ReadOnlyColumn { column_id: String },
    /// The record has no writable slot for the column.
    FieldRejected { column_id: String },
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowOutOfRange { row_index, len } => {
                write!(f, "row {row_index} is out of range for {len} rows")
            }
            Self::UnknownColumn { column_id } => write!(f, "unknown column '{column_id}'"),
            Self::ReadOnlyColumn { column_id } => write!(f, "column '{column_id}' is read-only"),
            Self::FieldRejected { column_id } => {
                write!(f, "record has no writable slot for '{column_id}'")
            }
        }
    }
}

/// Result of [`RowStore::commit`].
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum CommitOutcome {
    /// The value was written and logged.
    Applied(ChangeLogEntry),
    /// Nothing changed: neither the store nor the change log.
    Ignored(IgnoreReason),
}

impl CommitOutcome {
    /// Returns `true` if the commit was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The log entry written by an applied commit.
    pub fn entry(&self) -> Option<&ChangeLogEntry> {
        match self {
            Self::Applied(entry) => Some(entry),
            Self::Ignored(_) => None,
        }
    }
}

/// Host-owned ordered collection of records.
pub struct RowStore<R> {
    schema: Arc<ColumnSchema<R>>,
    rows: Property<Rows<R>>,
    generation: AtomicU64,
    change_log: ChangeLog,
    data_changed: Signal<(usize, String)>,
    reset: Signal<u64>,
}

impl<R> RowStore<R> {
    /// The schema commits are resolved against.
    pub fn schema(&self) -> &Arc<ColumnSchema<R>> {
        &self.schema
    }

    /// Number of full replacements performed so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The log of the most recent commit.
    pub fn change_log(&self) -> &ChangeLog {
        &self.change_log
    }

    /// Signal emitted after every applied commit.
    pub fn data_changed(&self) -> &Signal<(usize, String)> {
        &self.data_changed
    }

    /// Signal emitted after every full replacement, carrying the new generation.
    pub fn reset(&self) -> &Signal<u64> {
        &self.reset
    }
}

impl<R: Record> RowStore<R> {
    /// Creates a store holding `rows`, interpreted through `schema`.
    pub fn new(schema: Arc<ColumnSchema<R>>, rows: Vec<R>) -> Self {
        Self {
            schema,
            rows: Property::new(Arc::new(rows.into_iter().map(Arc::new).collect())),
            generation: AtomicU64::new(0),
            change_log: ChangeLog::new(),
            data_changed: Signal::new(),
            reset: Signal::new(),
        }
    }

    /// The current sequence of records.
    pub fn snapshot(&self) -> Rows<R> {
        self.rows.get()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.with(|rows| rows.len())
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The record at `row_index`.
    pub fn get(&self, row_index: usize) -> Option<Arc<R>> {
        self.rows.with(|rows| rows.get(row_index).cloned())
    }

    /// Writes `value` into the slot of `column_id` on the record at `row_index`.
    ///
    /// On success the previous value is captured into the change log before the
    /// new sequence becomes visible to listeners. Writing the value already in
    /// the slot is still an applied commit; its log entry has equal old and new
    /// values.
    ///
    /// Stale and invalid commits never fail loudly: they return
    /// [`CommitOutcome::Ignored`] and leave both the store and the log as they
    /// were.
    pub fn commit(&self, row_index: usize, column_id: &str, value: CellValue) -> CommitOutcome {
        let _span = tracing::debug_span!(target: targets::STORE, span_names::COMMIT, row_index, column_id)
            .entered();

        let outcome = self.try_commit(row_index, column_id, value);
        match &outcome {
            CommitOutcome::Applied(entry) => {
                tracing::debug!(
                    target: targets::STORE,
                    old_value = %entry.old_value,
                    new_value = %entry.new_value,
                    "commit applied"
                );
                self.change_log.record(entry.clone());
                self.data_changed.emit((row_index, entry.column_id.clone()));
            }
            CommitOutcome::Ignored(reason) => {
                tracing::debug!(target: targets::STORE, %reason, "commit ignored");
            }
        }
        outcome
    }

    fn try_commit(&self, row_index: usize, column_id: &str, value: CellValue) -> CommitOutcome {
        let Some(column) = self.schema.column(column_id) else {
            return CommitOutcome::Ignored(IgnoreReason::UnknownColumn {
                column_id: column_id.to_string(),
            });
        };
        if !column.is_editable() {
            return CommitOutcome::Ignored(IgnoreReason::ReadOnlyColumn {
                column_id: column_id.to_string(),
            });
        }

        let current = self.snapshot();
        let Some(record) = current.get(row_index) else {
            return CommitOutcome::Ignored(IgnoreReason::RowOutOfRange {
                row_index,
                len: current.len(),
            });
        };

        let rejected = || {
            CommitOutcome::Ignored(IgnoreReason::FieldRejected {
                column_id: column_id.to_string(),
            })
        };
        let field = column.field_key();
        let Some(old_value) = record.field(field) else {
            return rejected();
        };
        let mut updated = R::clone(record);
        if !updated.set_field(field, value.clone()) {
            return rejected();
        }

        let mut next: Vec<Arc<R>> = Vec::with_capacity(current.len());
        next.extend(current[..row_index].iter().cloned());
        next.push(Arc::new(updated));
        next.extend(current[row_index + 1..].iter().cloned());
        self.rows.set_silent(Arc::new(next));

        CommitOutcome::Applied(ChangeLogEntry {
            row_index,
            column_id: column_id.to_string(),
            old_value,
            new_value: value,
        })
    }

    /// Replaces every record with `count` fresh ones from `generator`.
    ///
    /// Bumps the generation, clears the change log and emits `reset`. Returns
    /// the new generation.
    pub fn regenerate(&self, count: usize, generator: &mut dyn DataGenerator<R>) -> u64 {
        let _perf = PerfSpan::new(span_names::REGENERATE);

        let rows = make_data(count, generator);
        self.rows
            .set_silent(Arc::new(rows.into_iter().map(Arc::new).collect()));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.change_log.clear();

        tracing::debug!(target: targets::STORE, count, generation, "rows regenerated");
        self.reset.emit(generation);
        generation
    }
}

impl<R: Record + fmt::Debug> fmt::Debug for RowStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStore")
            .field("len", &self.len())
            .field("generation", &self.generation())
            .field("change_log", &self.change_log)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PersonGenerator;
    use crate::person::{Person, person_columns};
    use parking_lot::Mutex;

    fn store(rows: Vec<Person>) -> RowStore<Person> {
        RowStore::new(Arc::new(person_columns().unwrap()), rows)
    }

    fn people() -> Vec<Person> {
        vec![
            Person::new("Ann", "Lee", 30, 12, "single", 80),
            Person::new("Bob", "Kim", 41, 3, "complicated", 10),
            Person::new("Cy", "Park", 22, 600, "relationship", 55),
        ]
    }

    #[test]
    fn test_commit_replaces_one_slot() {
        let store = store(people());
        let before = store.snapshot();

        let outcome = store.commit(0, "firstName", CellValue::from("Anna"));
        assert!(outcome.is_applied());

        let after = store.snapshot();
        assert_eq!(after[0].first_name, CellValue::from("Anna"));
        assert_eq!(
            Person {
                first_name: before[0].first_name.clone(),
                ..(*after[0]).clone()
            },
            *before[0]
        );

        // Untouched records are the same allocation.
        assert!(Arc::ptr_eq(&before[1], &after[1]));
        assert!(Arc::ptr_eq(&before[2], &after[2]));
        assert!(!Arc::ptr_eq(&before[0], &after[0]));
    }

    #[test]
    fn test_commit_logs_old_and_new() {
        let store = store(people());
        let _ = store.commit(0, "firstName", CellValue::from("Anna"));

        let entry = store.change_log().latest().unwrap();
        assert_eq!(entry.row_index, 0);
        assert_eq!(entry.column_id, "firstName");
        assert_eq!(entry.old_value, CellValue::from("Ann"));
        assert_eq!(entry.new_value, CellValue::from("Anna"));
    }

    #[test]
    fn test_commit_same_value_is_idempotent() {
        let store = store(people());
        let before = store.snapshot();

        let outcome = store.commit(1, "status", CellValue::from("complicated"));
        let entry = outcome.entry().unwrap();
        assert!(entry.is_noop());

        let after = store.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(
            before.iter().map(|p| (**p).clone()).collect::<Vec<_>>(),
            after.iter().map(|p| (**p).clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_out_of_range_commit_is_noop() {
        let store = store(people());
        let _ = store.commit(0, "firstName", CellValue::from("Anna"));
        let before = store.snapshot();
        let log_before = store.change_log().latest();

        let outcome = store.commit(5, "age", CellValue::from("40"));
        assert_eq!(
            outcome,
            CommitOutcome::Ignored(IgnoreReason::RowOutOfRange { row_index: 5, len: 3 })
        );
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.change_log().latest(), log_before);
    }

    #[test]
    fn test_unknown_and_read_only_columns_ignored() {
        let schema = ColumnSchema::<Person>::new(vec![
            crate::column::ColumnDef::accessor_key("firstName"),
            crate::column::ColumnDef::accessor_key("age").editable(false),
        ])
        .unwrap();
        let store = RowStore::new(Arc::new(schema), people());

        assert!(matches!(
            store.commit(0, "height", CellValue::from("1")),
            CommitOutcome::Ignored(IgnoreReason::UnknownColumn { .. })
        ));
        assert!(matches!(
            store.commit(0, "age", CellValue::from("1")),
            CommitOutcome::Ignored(IgnoreReason::ReadOnlyColumn { .. })
        ));
        assert!(store.change_log().is_empty());
    }

    #[test]
    fn test_derived_column_commits_to_its_id() {
        let store = store(people());
        let _ = store.commit(2, "lastName", CellValue::from("Parker"));
        assert_eq!(store.get(2).unwrap().last_name, CellValue::from("Parker"));
    }

    #[test]
    fn test_regenerate_exact_count_and_clears_log() {
        let store = store(people());
        let _ = store.commit(0, "firstName", CellValue::from("Anna"));

        let resets = Arc::new(Mutex::new(Vec::new()));
        let resets_clone = resets.clone();
        store.reset().connect(move |generation| {
            resets_clone.lock().push(*generation);
        });

        let mut generator = PersonGenerator::new(Some(3));
        assert_eq!(store.regenerate(8, &mut generator), 1);
        assert_eq!(store.len(), 8);
        assert!(store.change_log().is_empty());

        assert_eq!(store.regenerate(0, &mut generator), 2);
        assert!(store.is_empty());
        assert_eq!(*resets.lock(), vec![1, 2]);
    }

    #[test]
    fn test_data_changed_signal() {
        let store = store(people());
        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        store.data_changed().connect(move |(row, column)| {
            changes_clone.lock().push((*row, column.clone()));
        });

        let _ = store.commit(1, "age", CellValue::from("42"));
        let _ = store.commit(9, "age", CellValue::from("42"));

        assert_eq!(*changes.lock(), vec![(1, "age".to_string())]);
    }

    #[test]
    fn test_log_recorded_before_data_changed() {
        let store = Arc::new(store(people()));
        let seen = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&store);
        let seen_clone = seen.clone();
        store.data_changed().connect(move |_| {
            if let Some(store) = weak.upgrade() {
                *seen_clone.lock() = store.change_log().latest();
            }
        });

        let _ = store.commit(0, "visits", CellValue::from("13"));
        let entry = seen.lock().clone().unwrap();
        assert_eq!(entry.new_value, CellValue::from("13"));
    }
}
