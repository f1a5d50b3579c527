//! Inline cell editing.
//!
//! Every visible editable cell owns an [`EditBuffer`]: a draft string that
//! starts out equal to the committed value, diverges while the user types, and
//! is flushed to the row store when the cell loses focus.
//!
//! A buffer is either [`EditState::Clean`] or [`EditState::Dirty`]. Whenever
//! the committed value it was built from changes from outside, or the store is
//! regenerated, the buffer is reset to the new committed value. A pending
//! draft is discarded in that case; the outside write wins.
//!
//! [`CellEditController`] keeps the buffers in step with the rendered
//! [`TableView`]: buffers appear when a cell is rendered and disappear when it
//! leaves the page.

use std::collections::HashMap;
use std::fmt;

use controlled_table_core::logging::targets;
use serde::Serialize;

use crate::store::CommitOutcome;
use crate::value::CellValue;
use crate::view_model::TableView;

/// Whether a buffer holds local input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    /// The draft equals the committed value.
    #[default]
    Clean,
    /// The draft differs from the committed value.
    Dirty,
}

/// Draft value of one rendered cell.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    draft: String,
    committed: String,
    value: CellValue,
    generation: u64,
    state: EditState,
}

impl EditBuffer {
    /// A clean buffer for `committed`, read from store generation `generation`.
    pub fn new(committed: &CellValue, generation: u64) -> Self {
        let text = committed.to_input();
        Self {
            draft: text.clone(),
            committed: text,
            value: committed.clone(),
            generation,
            state: EditState::Clean,
        }
    }

    /// The text the editor shows.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// The committed value the buffer was last reconciled with, as text.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// The committed value itself, with its original type.
    pub fn committed_value(&self) -> &CellValue {
        &self.value
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == EditState::Dirty
    }

    /// Replaces the draft with raw user input.
    pub fn input(&mut self, raw: impl Into<String>) {
        self.draft = raw.into();
        self.state = if self.draft == self.committed {
            EditState::Clean
        } else {
            EditState::Dirty
        };
    }

    /// Resets the buffer if the committed value or the store generation moved.
    ///
    /// Returns `true` when the buffer was reset.
    pub fn reconcile(&mut self, committed: &CellValue, generation: u64) -> bool {
        if *committed == self.value && generation == self.generation {
            return false;
        }
        self.committed = committed.to_input();
        self.draft = self.committed.clone();
        self.value = committed.clone();
        self.generation = generation;
        self.state = EditState::Clean;
        true
    }

    /// Discards the draft.
    pub fn revert(&mut self) {
        self.draft = self.committed.clone();
        self.state = EditState::Clean;
    }
}

/// Addresses a cell by store row and column id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellKey {
    pub row_index: usize,
    pub column_id: String,
}

impl CellKey {
    pub fn new(row_index: usize, column_id: impl Into<String>) -> Self {
        Self {
            row_index,
            column_id: column_id.into(),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.row_index, self.column_id)
    }
}

/// The value a blur sends to the row store.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitPayload {
    /// The buffer was clean; the committed value goes back as stored.
    Unchanged(CellValue),
    /// Raw input; the column decides how to parse it.
    Input(String),
}

/// A draft ready to be written to the row store.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub key: CellKey,
    pub payload: CommitPayload,
}

impl CommitRequest {
    /// The raw input, if the buffer held any.
    pub fn raw(&self) -> Option<&str> {
        match &self.payload {
            CommitPayload::Input(raw) => Some(raw),
            CommitPayload::Unchanged(_) => None,
        }
    }
}

/// Owns the edit buffers of every rendered editable cell.
#[derive(Debug)]
pub struct CellEditController {
    buffers: HashMap<CellKey, EditBuffer>,
    focused: Option<CellKey>,
    generation: Option<u64>,
    commit_on_blur_when_clean: bool,
}

impl Default for CellEditController {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CellEditController {
    /// Creates a controller.
    ///
    /// With `commit_on_blur_when_clean`, every blur commits, including blurs of
    /// cells the user never changed. Without it only dirty cells commit.
    pub fn new(commit_on_blur_when_clean: bool) -> Self {
        Self {
            buffers: HashMap::new(),
            focused: None,
            generation: None,
            commit_on_blur_when_clean,
        }
    }

    /// Brings the buffers in line with a freshly rendered view.
    ///
    /// Creates buffers for newly visible editable cells, reconciles existing
    /// ones against their committed value and the view's store generation, and
    /// drops buffers whose cell is no longer rendered. A new store generation
    /// also drops focus. Returns the number of buffers that were reset.
    pub fn sync(&mut self, view: &TableView) -> usize {
        if self.generation.replace(view.generation) != Some(view.generation) {
            if let Some(key) = self.focused.take() {
                tracing::debug!(target: targets::EDITOR, cell = %key, "focus dropped by regenerate");
            }
        }

        let mut visible = HashMap::with_capacity(self.buffers.len());
        let mut reset = 0;

        for cell in view.cells().filter(|cell| cell.editable) {
            let key = CellKey::new(cell.row_index, cell.column_id.clone());
            let buffer = match self.buffers.remove(&key) {
                Some(mut buffer) => {
                    let was_dirty = buffer.is_dirty();
                    if buffer.reconcile(&cell.value, view.generation) {
                        reset += 1;
                        if was_dirty {
                            tracing::debug!(
                                target: targets::EDITOR,
                                cell = %key,
                                "draft discarded by external change"
                            );
                        }
                    }
                    buffer
                }
                None => EditBuffer::new(&cell.value, view.generation),
            };
            visible.insert(key, buffer);
        }

        let unmounted = self.buffers.len();
        self.buffers = visible;
        if self
            .focused
            .as_ref()
            .is_some_and(|key| !self.buffers.contains_key(key))
        {
            self.focused = None;
        }

        tracing::trace!(
            target: targets::EDITOR,
            buffers = self.buffers.len(),
            reset,
            unmounted,
            "edit buffers synced"
        );
        reset
    }

    /// Focuses a cell.
    ///
    /// If another cell had focus it is blurred first, and its commit request
    /// (if any) is returned so the caller can apply it before anything else.
    pub fn focus(&mut self, key: &CellKey) -> Option<CommitRequest> {
        if self.focused.as_ref() == Some(key) {
            return None;
        }
        let request = self.focused.clone().and_then(|previous| self.blur(&previous));
        if self.buffers.contains_key(key) {
            self.focused = Some(key.clone());
        }
        request
    }

    /// Feeds raw input to a cell's buffer.
    ///
    /// Returns `false` if the cell has no buffer (not rendered or read-only).
    pub fn input(&mut self, key: &CellKey, raw: impl Into<String>) -> bool {
        let Some(buffer) = self.buffers.get_mut(key) else {
            tracing::trace!(target: targets::EDITOR, cell = %key, "input for unknown cell");
            return false;
        };
        buffer.input(raw);
        tracing::trace!(target: targets::EDITOR, cell = %key, draft = buffer.draft(), "input");
        true
    }

    /// Blurs a cell, producing the commit it triggers.
    pub fn blur(&mut self, key: &CellKey) -> Option<CommitRequest> {
        if self.focused.as_ref() == Some(key) {
            self.focused = None;
        }
        let buffer = self.buffers.get(key)?;
        let payload = if buffer.is_dirty() {
            CommitPayload::Input(buffer.draft().to_string())
        } else if self.commit_on_blur_when_clean {
            CommitPayload::Unchanged(buffer.committed_value().clone())
        } else {
            return None;
        };
        Some(CommitRequest {
            key: key.clone(),
            payload,
        })
    }

    /// Returns a buffer to the clean state after its commit was processed.
    ///
    /// An applied commit adopts the newly committed value; an ignored one
    /// discards the draft.
    pub fn finish_commit(&mut self, key: &CellKey, outcome: &CommitOutcome) {
        let Some(buffer) = self.buffers.get_mut(key) else {
            return;
        };
        match outcome {
            CommitOutcome::Applied(entry) => {
                let generation = buffer.generation;
                buffer.reconcile(&entry.new_value, generation);
                buffer.revert();
            }
            CommitOutcome::Ignored(_) => buffer.revert(),
        }
    }

    /// The buffer of a rendered editable cell.
    pub fn buffer(&self, key: &CellKey) -> Option<&EditBuffer> {
        self.buffers.get(key)
    }

    pub fn focused(&self) -> Option<&CellKey> {
        self.focused.as_ref()
    }

    /// Number of live buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_log::ChangeLogEntry;
    use crate::store::IgnoreReason;
    use crate::view_model::{Cell, Row};

    fn view(generation: u64, cells: &[(usize, &str, CellValue, bool)]) -> TableView {
        TableView {
            header_groups: Vec::new(),
            footer_groups: Vec::new(),
            rows: cells
                .iter()
                .map(|(row_index, column_id, value, editable)| Row {
                    index: *row_index,
                    cells: vec![Cell {
                        id: format!("{row_index}_{column_id}"),
                        row_index: *row_index,
                        column_id: column_id.to_string(),
                        value: value.clone(),
                        content: value.to_string(),
                        editable: *editable,
                    }],
                })
                .collect(),
            page_index: 0,
            page_size: 10,
            page_count: 1,
            total_rows: cells.len(),
            generation,
        }
    }

    #[test]
    fn test_buffer_state_machine() {
        let mut buffer = EditBuffer::new(&CellValue::from("Ann"), 0);
        assert_eq!(buffer.state(), EditState::Clean);

        buffer.input("Anna");
        assert!(buffer.is_dirty());
        assert_eq!(buffer.draft(), "Anna");

        buffer.input("Ann");
        assert_eq!(buffer.state(), EditState::Clean);

        buffer.input("X");
        buffer.revert();
        assert_eq!(buffer.draft(), "Ann");
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn test_clean_buffer_follows_external_change() {
        let key = CellKey::new(0, "firstName");
        let mut editor = CellEditController::default();

        editor.sync(&view(0, &[(0, "firstName", "Ann".into(), true)]));
        assert_eq!(editor.buffer(&key).unwrap().draft(), "Ann");

        assert_eq!(editor.sync(&view(0, &[(0, "firstName", "Bea".into(), true)])), 1);
        assert_eq!(editor.buffer(&key).unwrap().draft(), "Bea");
    }

    #[test]
    fn test_dirty_draft_discarded_on_regenerate() {
        let key = CellKey::new(0, "firstName");
        let mut editor = CellEditController::default();
        editor.sync(&view(0, &[(0, "firstName", "Ann".into(), true)]));

        editor.input(&key, "Anna");
        assert!(editor.buffer(&key).unwrap().is_dirty());

        // Same committed value but a new generation still resets the draft.
        assert_eq!(editor.sync(&view(1, &[(0, "firstName", "Ann".into(), true)])), 1);
        let buffer = editor.buffer(&key).unwrap();
        assert_eq!(buffer.draft(), "Ann");
        assert_eq!(buffer.state(), EditState::Clean);
    }

    #[test]
    fn test_dirty_draft_survives_unrelated_render() {
        let key = CellKey::new(0, "firstName");
        let mut editor = CellEditController::default();
        let rendered = view(0, &[(0, "firstName", "Ann".into(), true)]);
        editor.sync(&rendered);

        editor.input(&key, "Anna");
        assert_eq!(editor.sync(&rendered), 0);
        assert_eq!(editor.buffer(&key).unwrap().draft(), "Anna");
    }

    #[test]
    fn test_unmounted_and_read_only_cells_have_no_buffer() {
        let mut editor = CellEditController::default();
        editor.sync(&view(
            0,
            &[(0, "firstName", "Ann".into(), true), (1, "age", CellValue::Int(30), false)],
        ));
        assert_eq!(editor.len(), 1);
        assert!(!editor.input(&CellKey::new(1, "age"), "31"));

        editor.sync(&view(0, &[(5, "firstName", "Eve".into(), true)]));
        assert!(editor.buffer(&CellKey::new(0, "firstName")).is_none());
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn test_blur_commits_even_when_clean() {
        let key = CellKey::new(0, "age");
        let mut editor = CellEditController::default();
        editor.sync(&view(0, &[(0, "age", CellValue::Int(30), true)]));

        let request = editor.blur(&key).unwrap();
        assert_eq!(request.payload, CommitPayload::Unchanged(CellValue::Int(30)));
        assert_eq!(request.raw(), None);

        let mut strict = CellEditController::new(false);
        strict.sync(&view(0, &[(0, "age", CellValue::Int(30), true)]));
        assert!(strict.blur(&key).is_none());
        strict.input(&key, "31");
        assert_eq!(strict.blur(&key).unwrap().raw(), Some("31"));
    }

    #[test]
    fn test_focus_blurs_previous_cell() {
        let a = CellKey::new(0, "firstName");
        let b = CellKey::new(1, "firstName");
        let mut editor = CellEditController::new(false);
        editor.sync(&view(
            0,
            &[(0, "firstName", "Ann".into(), true), (1, "firstName", "Bob".into(), true)],
        ));

        assert!(editor.focus(&a).is_none());
        editor.input(&a, "Anna");

        let request = editor.focus(&b).unwrap();
        assert_eq!(request.key, a);
        assert_eq!(request.payload, CommitPayload::Input("Anna".into()));
        assert_eq!(editor.focused(), Some(&b));
    }

    #[test]
    fn test_finish_commit_returns_to_clean() {
        let key = CellKey::new(0, "firstName");
        let mut editor = CellEditController::default();
        editor.sync(&view(0, &[(0, "firstName", "Ann".into(), true)]));

        editor.input(&key, "Anna");
        let applied = CommitOutcome::Applied(ChangeLogEntry {
            row_index: 0,
            column_id: "firstName".into(),
            old_value: "Ann".into(),
            new_value: "Anna".into(),
        });
        editor.finish_commit(&key, &applied);
        let buffer = editor.buffer(&key).unwrap();
        assert_eq!(buffer.draft(), "Anna");
        assert_eq!(buffer.committed(), "Anna");
        assert!(!buffer.is_dirty());

        editor.input(&key, "Zed");
        let ignored = CommitOutcome::Ignored(IgnoreReason::RowOutOfRange { row_index: 0, len: 0 });
        editor.finish_commit(&key, &ignored);
        assert_eq!(editor.buffer(&key).unwrap().draft(), "Anna");
    }

    #[test]
    fn test_retyping_the_committed_text_recommits_the_typed_value() {
        let key = CellKey::new(0, "age");
        let mut editor = CellEditController::default();
        editor.sync(&view(0, &[(0, "age", CellValue::Int(2), true)]));

        editor.input(&key, "5");
        editor.input(&key, "2");
        let request = editor.blur(&key).unwrap();
        assert_eq!(request.payload, CommitPayload::Unchanged(CellValue::Int(2)));
    }

    #[test]
    fn test_regenerate_drops_focus() {
        let a = CellKey::new(0, "firstName");
        let b = CellKey::new(1, "firstName");
        let mut editor = CellEditController::default();
        let cells: [(usize, &str, CellValue, bool); 2] = [
            (0, "firstName", "Ann".into(), true),
            (1, "firstName", "Bob".into(), true),
        ];
        editor.sync(&view(0, &cells));

        assert!(editor.focus(&a).is_none());
        assert_eq!(editor.focused(), Some(&a));

        editor.sync(&view(0, &cells));
        assert_eq!(editor.focused(), Some(&a));

        editor.sync(&view(1, &cells));
        assert_eq!(editor.focused(), None);
        assert!(editor.focus(&b).is_none());
        assert_eq!(editor.focused(), Some(&b));
    }
}
