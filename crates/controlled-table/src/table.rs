//! The host: one object that owns the row store, the view-model, the
//! controlled state and the edit buffers, and routes UI events between them.
//!
//! Events are processed one at a time and each one completes before the next
//! is accepted. After every event the host pushes its state snapshot back into
//! the builder and re-syncs the edit buffers, so [`ControlledTable::render`]
//! never observes a half-applied change.
//!
//! # Example
//!
//! ```
//! use controlled_table::{CellKey, ControlledTable, TableConfig, TableEvent};
//!
//! let config = TableConfig { seed: Some(1), ..TableConfig::default() };
//! let mut table = ControlledTable::people(config).unwrap();
//!
//! let key = CellKey::new(0, "firstName");
//! table.handle(TableEvent::Focus(key.clone()));
//! table.handle(TableEvent::Input(key.clone(), "Anna".into()));
//! table.handle(TableEvent::Blur(key));
//!
//! assert_eq!(table.store().get(0).unwrap().first_name.to_string(), "Anna");
//! assert!(table.change_log().unwrap().contains("New value: Anna"));
//! ```

use std::sync::Arc;

use controlled_table_core::logging::targets;
use serde::Serialize;

use crate::bridge::ControlledState;
use crate::column::ColumnSchema;
use crate::config::TableConfig;
use crate::editor::{CellEditController, CellKey, CommitPayload, CommitRequest};
use crate::error::Result;
use crate::generator::{DataGenerator, PersonGenerator, make_data};
use crate::person::{Person, person_columns};
use crate::record::Record;
use crate::state::{StateUpdate, TableState};
use crate::store::{CommitOutcome, RowStore};
use crate::value::CellValue;
use crate::view_model::{Header, ViewModelBuilder};

/// Page heading shown by hosts.
pub const TITLE: &str = "Fully Controlled Table";

/// Line shown under the heading.
pub const DESCRIPTION: &str = "Table that demonstrates how to access the table's internal data \
     management state. Table cells are editable: focus a cell to start editing \
     (changes apply on blur).";

/// A UI event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A cell gained focus. Blurs the previously focused cell.
    Focus(CellKey),
    /// Raw input in a cell's editor.
    Input(CellKey, String),
    /// A cell lost focus; commits its draft.
    Blur(CellKey),
    /// A pagination, sorting or visibility request.
    State(StateUpdate),
    /// The "change table data" action.
    Regenerate,
}

/// Header or footer cell as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedHeader {
    pub content: String,
    pub col_span: usize,
}

impl From<&Header> for RenderedHeader {
    fn from(header: &Header) -> Self {
        Self {
            content: header.content.clone(),
            col_span: header.col_span,
        }
    }
}

/// Body cell as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedCell {
    pub key: CellKey,
    /// The edit draft of a dirty cell, the rendered value otherwise.
    pub content: String,
    pub editable: bool,
    pub dirty: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTable {
    pub title: &'static str,
    pub description: &'static str,
    pub header_rows: Vec<Vec<RenderedHeader>>,
    pub rows: Vec<Vec<RenderedCell>>,
    pub footer_rows: Vec<Vec<RenderedHeader>>,
    pub page_index: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub can_previous_page: bool,
    pub can_next_page: bool,
    /// The rendered change log entry, if any.
    pub change_log: Option<String>,
}

/// A fully controlled editable table.
pub struct ControlledTable<R, G> {
    config: TableConfig,
    store: Arc<RowStore<R>>,
    builder: ViewModelBuilder<R>,
    bridge: ControlledState,
    editor: CellEditController,
    generator: G,
}

impl ControlledTable<Person, PersonGenerator> {
    /// The demo table: [`person_columns`] over generated people.
    pub fn people(config: TableConfig) -> Result<Self> {
        let generator = PersonGenerator::new(config.seed);
        Ok(Self::new(config, person_columns()?, generator))
    }
}

impl<R: Record, G: DataGenerator<R>> ControlledTable<R, G> {
    /// Builds a table with `config.initial_row_count` generated rows.
    ///
    /// The host state is seeded from the builder's initial state and handed
    /// straight back to it, so the table starts out controlled.
    pub fn new(config: TableConfig, schema: ColumnSchema<R>, mut generator: G) -> Self {
        let rows = make_data(config.initial_row_count, &mut generator);
        let store = Arc::new(RowStore::new(Arc::new(schema), rows));
        let builder = ViewModelBuilder::new(store.clone(), config.initial_state());
        let bridge = ControlledState::seeded_from(&builder);
        let editor = CellEditController::new(config.commit_on_blur_when_clean);

        let mut table = Self {
            config,
            store,
            builder,
            bridge,
            editor,
            generator,
        };
        table.refresh();
        tracing::debug!(target: targets::TABLE, rows = table.store.len(), "table created");
        table
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<RowStore<R>> {
        &self.store
    }

    pub fn builder(&self) -> &ViewModelBuilder<R> {
        &self.builder
    }

    pub fn bridge(&self) -> &ControlledState {
        &self.bridge
    }

    pub fn editor(&self) -> &CellEditController {
        &self.editor
    }

    /// The host-owned state snapshot.
    pub fn state(&self) -> TableState {
        self.bridge.state()
    }

    /// The latest change log entry, rendered.
    pub fn change_log(&self) -> Option<String> {
        self.store.change_log().render()
    }

    /// Processes one UI event. Returns the commit it triggered, if any.
    pub fn handle(&mut self, event: TableEvent) -> Option<CommitOutcome> {
        tracing::trace!(target: targets::TABLE, ?event, "event");
        let outcome = match event {
            TableEvent::Focus(key) => self.editor.focus(&key).map(|request| self.apply(request)),
            TableEvent::Input(key, raw) => {
                self.editor.input(&key, raw);
                None
            }
            TableEvent::Blur(key) => self.editor.blur(&key).map(|request| self.apply(request)),
            TableEvent::State(update) => {
                self.builder.dispatch(update);
                None
            }
            TableEvent::Regenerate => {
                self.regenerate();
                None
            }
        };
        self.refresh();
        outcome
    }

    fn apply(&mut self, request: CommitRequest) -> CommitOutcome {
        let CommitRequest { key, payload } = request;
        let value = match payload {
            CommitPayload::Unchanged(value) => value,
            CommitPayload::Input(raw) => self
                .store
                .schema()
                .column(&key.column_id)
                .map(|column| column.parse(&raw))
                .unwrap_or_else(|| CellValue::from_input(&raw)),
        };
        let outcome = self.store.commit(key.row_index, &key.column_id, value);
        self.editor.finish_commit(&key, &outcome);
        outcome
    }

    /// Commits a value directly, bypassing the edit buffers.
    pub fn commit(&mut self, row_index: usize, column_id: &str, value: CellValue) -> CommitOutcome {
        let outcome = self.store.commit(row_index, column_id, value);
        self.refresh();
        outcome
    }

    /// Replaces every row with `config.initial_row_count` fresh ones and clears
    /// the change log. Pending drafts are discarded.
    pub fn regenerate(&mut self) -> u64 {
        self.regenerate_with(self.config.initial_row_count)
    }

    /// Like [`ControlledTable::regenerate`] with an explicit row count.
    pub fn regenerate_with(&mut self, count: usize) -> u64 {
        let generation = self.store.regenerate(count, &mut self.generator);
        self.refresh();
        generation
    }

    /// Replaces the host state snapshot.
    pub fn override_state(&mut self, state: TableState) -> bool {
        let changed = self.bridge.override_state(state);
        self.refresh();
        changed
    }

    fn refresh(&mut self) {
        self.bridge.sync(&self.builder);
        let view = self.builder.view();
        self.editor.sync(&view);
    }

    /// Produces the current frame.
    pub fn render(&mut self) -> RenderedTable {
        self.refresh();
        let view = self.builder.view();

        let rows = view
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| {
                        let key = CellKey::new(cell.row_index, cell.column_id.clone());
                        match self.editor.buffer(&key) {
                            Some(buffer) => RenderedCell {
                                content: if buffer.is_dirty() {
                                    buffer.draft().to_string()
                                } else {
                                    cell.content.clone()
                                },
                                editable: true,
                                dirty: buffer.is_dirty(),
                                key,
                            },
                            None => RenderedCell {
                                content: cell.content.clone(),
                                editable: false,
                                dirty: false,
                                key,
                            },
                        }
                    })
                    .collect()
            })
            .collect();

        let header_rows = view
            .header_groups
            .iter()
            .map(|group| group.headers.iter().map(RenderedHeader::from).collect())
            .collect();
        let footer_rows = view
            .footer_groups
            .iter()
            .map(|group| group.headers.iter().map(RenderedHeader::from).collect())
            .collect();

        RenderedTable {
            title: TITLE,
            description: DESCRIPTION,
            header_rows,
            rows,
            footer_rows,
            page_index: view.page_index,
            page_count: view.page_count,
            total_rows: view.total_rows,
            can_previous_page: view.can_previous_page(),
            can_next_page: view.can_next_page(),
            change_log: self.change_log(),
        }
    }
}

impl<R: Record + Serialize, G> ControlledTable<R, G> {
    /// The whole row store as pretty-printed JSON.
    pub fn data_json(&self) -> Result<String> {
        let rows = self.store.snapshot();
        let records: Vec<&R> = rows.iter().map(Arc::as_ref).collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}
