//! The view-model: a paginated, sorted projection of the row store.
//!
//! [`build_view`] is a pure function of the rows, the schema and a
//! [`TableState`] snapshot. [`ViewModelBuilder`] memoizes it behind a
//! [`Binding`] and decides which snapshot to feed it: its own internal state
//! (uncontrolled) or the one a host supplied through [`TableOptions`]
//! (controlled).
//!
//! State transitions never mutate the snapshot in place. The builder packages
//! each one as an [`Updater`] and hands it to the `on_state_change` handler
//! when the host installed one, or applies it to its internal state otherwise.

use std::fmt;
use std::sync::Arc;

use controlled_table_core::logging::{span_names, targets};
use controlled_table_core::{Binding, ConnectionId, PerfSpan, Property};
use parking_lot::RwLock;
use serde::Serialize;

use crate::column::{Column, ColumnSchema};
use crate::record::Record;
use crate::state::{StateUpdate, TableState, Updater};
use crate::store::RowStore;
use crate::value::CellValue;

/// Direction of an active sort on a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One header or footer cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub column_id: String,
    /// Position among the visible columns.
    pub index: usize,
    pub content: String,
    pub col_span: usize,
    pub sort: Option<SortDirection>,
}

/// A row of headers (or footers).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderGroup {
    pub depth: usize,
    pub headers: Vec<Header>,
}

/// One visible body cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// `"{row_index}_{column_id}"`.
    pub id: String,
    /// Position of the record in the row store.
    pub row_index: usize,
    pub column_id: String,
    /// The committed value.
    pub value: CellValue,
    /// The committed value as rendered by the column.
    pub content: String,
    pub editable: bool,
}

/// One visible body row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Position of the record in the row store, not on the page.
    pub index: usize,
    pub cells: Vec<Cell>,
}

/// The projection for the current page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub header_groups: Vec<HeaderGroup>,
    pub footer_groups: Vec<HeaderGroup>,
    pub rows: Vec<Row>,
    /// The page actually shown, clamped into range.
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    /// Store generation the projection was built from.
    pub generation: u64,
}

impl TableView {
    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count
    }

    /// Every visible cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    /// The visible cell for a store row and column, if it is on this page.
    pub fn cell(&self, row_index: usize, column_id: &str) -> Option<&Cell> {
        self.cells()
            .find(|cell| cell.row_index == row_index && cell.column_id == column_id)
    }
}

/// Projects `rows` through `schema` under `state`.
///
/// Rows are stably sorted by the sort keys the schema knows (unknown keys are
/// skipped), then sliced to the requested page. Hidden columns are left out
/// of headers, footers and cells alike. An out-of-range page index shows the
/// last page.
pub fn build_view<R: Record>(
    rows: &[Arc<R>],
    schema: &ColumnSchema<R>,
    state: &TableState,
    generation: u64,
) -> TableView {
    let columns: Vec<&Column<R>> = schema
        .iter()
        .filter(|column| state.is_column_visible(column.id()))
        .collect();

    let order = sorted_order(rows, schema, state);

    let pagination = state.pagination;
    let page_size = pagination.page_size.max(1);
    let page_index = pagination.clamped_index(rows.len());
    let page_count = pagination.page_count(rows.len());

    let body = order
        .iter()
        .skip(page_index * page_size)
        .take(page_size)
        .map(|&row_index| Row {
            index: row_index,
            cells: columns
                .iter()
                .map(|column| {
                    let value = column.value(&rows[row_index]);
                    Cell {
                        id: format!("{row_index}_{}", column.id()),
                        row_index,
                        column_id: column.id().to_string(),
                        content: column.render_cell(row_index, &value),
                        value,
                        editable: column.is_editable(),
                    }
                })
                .collect(),
        })
        .collect();

    let headers = columns
        .iter()
        .enumerate()
        .map(|(index, column)| Header {
            column_id: column.id().to_string(),
            index,
            content: column.header().to_string(),
            col_span: 1,
            sort: state.sort_direction(column.id()).map(|desc| {
                if desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                }
            }),
        })
        .collect();

    let footers = columns
        .iter()
        .enumerate()
        .map(|(index, column)| Header {
            column_id: column.id().to_string(),
            index,
            content: column.render_footer().unwrap_or_default(),
            col_span: 1,
            sort: None,
        })
        .collect();

    TableView {
        header_groups: vec![HeaderGroup {
            depth: 0,
            headers,
        }],
        footer_groups: vec![HeaderGroup {
            depth: 0,
            headers: footers,
        }],
        rows: body,
        page_index,
        page_size,
        page_count,
        total_rows: rows.len(),
        generation,
    }
}

fn sorted_order<R: Record>(rows: &[Arc<R>], schema: &ColumnSchema<R>, state: &TableState) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();

    let keys: Vec<(&Column<R>, bool)> = state
        .sorting
        .iter()
        .filter_map(|spec| schema.column(&spec.id).map(|column| (column, spec.desc)))
        .collect();
    if keys.is_empty() {
        return order;
    }

    order.sort_by(|&a, &b| {
        keys.iter()
            .map(|(column, desc)| {
                let cmp = column.value(&rows[a]).sort_cmp(&column.value(&rows[b]));
                if *desc { cmp.reverse() } else { cmp }
            })
            .find(|cmp| cmp.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Callback the builder invokes instead of updating its own state.
pub type StateChangeHandler = Arc<dyn Fn(Updater) + Send + Sync>;

/// Options a host can replace through [`ViewModelBuilder::set_options`].
#[derive(Clone, Default)]
pub struct TableOptions {
    /// When set, the snapshot the builder projects with. Overrides the
    /// builder's internal state.
    pub state: Option<TableState>,
    /// When set, receives every state transition instead of the builder's
    /// internal state.
    pub on_state_change: Option<StateChangeHandler>,
}

impl TableOptions {
    /// Returns `true` when a host owns the state.
    pub fn is_controlled(&self) -> bool {
        self.on_state_change.is_some()
    }
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("state", &self.state)
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

/// Memoized view-model over a row store.
///
/// The projection is recomputed lazily on the first [`ViewModelBuilder::view`]
/// after the store commits, regenerates, or the effective state changes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use controlled_table::{
///     person_columns, Person, RowStore, StateUpdate, TableState, ViewModelBuilder,
/// };
///
/// let schema = Arc::new(person_columns().unwrap());
/// let rows = (0..25)
///     .map(|i| Person::new(format!("P{i}"), "Doe", i, 0, "single", 0))
///     .collect();
/// let store = Arc::new(RowStore::new(schema, rows));
///
/// let builder = ViewModelBuilder::new(store, TableState::default());
/// assert_eq!(builder.view().page_count, 3);
///
/// builder.dispatch(StateUpdate::NextPage);
/// assert_eq!(builder.view().rows[0].index, 10);
/// ```
pub struct ViewModelBuilder<R> {
    store: Arc<RowStore<R>>,
    initial_state: TableState,
    internal_state: Arc<Property<TableState>>,
    options: Arc<RwLock<TableOptions>>,
    view: Arc<Binding<Arc<TableView>>>,
    data_changed_id: ConnectionId,
    reset_id: ConnectionId,
}

impl<R: Record> ViewModelBuilder<R> {
    /// Creates a builder over `store` whose declared initial state is
    /// `initial_state`. The builder starts uncontrolled.
    pub fn new(store: Arc<RowStore<R>>, initial_state: TableState) -> Self {
        let internal_state = Arc::new(Property::new(initial_state.clone()));
        let options = Arc::new(RwLock::new(TableOptions::default()));

        let view = {
            let store = store.clone();
            let internal_state = internal_state.clone();
            let options = options.clone();
            Arc::new(Binding::new(move || {
                let _perf = PerfSpan::new(span_names::PROJECTION);
                let state = options
                    .read()
                    .state
                    .clone()
                    .unwrap_or_else(|| internal_state.get());
                let view = build_view(&store.snapshot(), store.schema(), &state, store.generation());
                tracing::debug!(
                    target: targets::VIEW_MODEL,
                    page_index = view.page_index,
                    rows = view.rows.len(),
                    generation = view.generation,
                    "view-model recomputed"
                );
                Arc::new(view)
            }))
        };

        let weak = Arc::downgrade(&view);
        let data_changed_id = store.data_changed().connect(move |_| {
            if let Some(view) = weak.upgrade() {
                view.invalidate();
            }
        });
        let weak = Arc::downgrade(&view);
        let reset_id = store.reset().connect(move |_| {
            if let Some(view) = weak.upgrade() {
                view.invalidate();
            }
        });

        Self {
            store,
            initial_state,
            internal_state,
            options,
            view,
            data_changed_id,
            reset_id,
        }
    }

    /// The store being projected.
    pub fn store(&self) -> &Arc<RowStore<R>> {
        &self.store
    }

    /// The state the builder declares as its starting point.
    pub fn initial_state(&self) -> &TableState {
        &self.initial_state
    }

    /// The snapshot the builder currently projects with.
    pub fn state(&self) -> TableState {
        self.options
            .read()
            .state
            .clone()
            .unwrap_or_else(|| self.internal_state.get())
    }

    /// A copy of the current options.
    pub fn options(&self) -> TableOptions {
        self.options.read().clone()
    }

    /// Replaces the options with `f(previous)`.
    ///
    /// Invalidates the projection if the effective state changed.
    pub fn set_options<F>(&self, f: F)
    where
        F: FnOnce(&TableOptions) -> TableOptions,
    {
        let before = self.state();
        {
            let mut options = self.options.write();
            let next = f(&options);
            *options = next;
        }
        if self.state() != before {
            tracing::debug!(target: targets::VIEW_MODEL, "options replaced the projection state");
            self.view.invalidate();
        }
    }

    /// Requests a state transition.
    ///
    /// When a host installed `on_state_change`, the handler receives the
    /// updater and the builder's own state is left alone. Otherwise the
    /// builder applies the updater to its internal state.
    pub fn dispatch(&self, update: StateUpdate) {
        let updater = Updater::new(update, self.store.len(), self.initial_state.clone());
        let handler = self.options.read().on_state_change.clone();

        match handler {
            Some(handler) => {
                tracing::debug!(target: targets::VIEW_MODEL, update = ?updater.update(), "state change forwarded");
                handler(updater);
            }
            None => {
                let next = updater.apply(&self.internal_state.get());
                if self.internal_state.set(next) {
                    tracing::debug!(target: targets::VIEW_MODEL, update = ?updater.update(), "internal state updated");
                    self.view.invalidate();
                }
            }
        }
    }

    /// Returns to the initial state through the regular transition path.
    pub fn reset_state(&self) {
        self.dispatch(StateUpdate::Reset);
    }

    /// The current projection, recomputed if anything it depends on changed.
    pub fn view(&self) -> Arc<TableView> {
        self.view.get()
    }

    /// Number of times the projection has been computed.
    pub fn revision(&self) -> u64 {
        self.view.revision()
    }

    pub fn page_count(&self) -> usize {
        self.view().page_count
    }

    pub fn can_next_page(&self) -> bool {
        self.view().can_next_page()
    }

    pub fn can_previous_page(&self) -> bool {
        self.view().can_previous_page()
    }
}

impl<R> Drop for ViewModelBuilder<R> {
    fn drop(&mut self) {
        self.store.data_changed().disconnect(self.data_changed_id);
        self.store.reset().disconnect(self.reset_id);
    }
}

impl<R> fmt::Debug for ViewModelBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModelBuilder")
            .field("initial_state", &self.initial_state)
            .field("options", &*self.options.read())
            .field("revision", &self.view.revision())
            .finish()
    }
}
