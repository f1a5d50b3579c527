//! The projection state snapshot and its transitions.
//!
//! [`TableState`] is the single input the view-model consults besides the
//! rows and the schema. It is plain data: every change to it is described by a
//! [`StateUpdate`], and [`Updater`] turns an update into the next snapshot
//! given the previous one. Whoever owns the state (the builder itself, or a
//! host through the controlled bridge) applies the updater.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::ColumnSchema;
use crate::error::{Error, Result};
use crate::record::Record;

/// Page cursor and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: 10,
        }
    }
}

impl PaginationState {
    /// Number of pages needed for `row_count` rows. Always at least one.
    pub fn page_count(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size.max(1)).max(1)
    }

    /// The page index clamped into `0..page_count`.
    pub fn clamped_index(&self, row_count: usize) -> usize {
        self.page_index.min(self.page_count(row_count) - 1)
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column id to sort by.
    pub id: String,
    /// Descending when `true`.
    pub desc: bool,
}

impl SortSpec {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

/// Snapshot of every projection parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableState {
    pub pagination: PaginationState,
    /// Sort keys, most significant first.
    pub sorting: Vec<SortSpec>,
    /// Per-column visibility. Columns not listed are visible.
    pub column_visibility: BTreeMap<String, bool>,
}

impl TableState {
    /// The default state with a different page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            pagination: PaginationState {
                page_index: 0,
                page_size: page_size.max(1),
            },
            ..Self::default()
        }
    }

    /// Returns `true` unless the column is explicitly hidden.
    pub fn is_column_visible(&self, column_id: &str) -> bool {
        self.column_visibility
            .get(column_id)
            .copied()
            .unwrap_or(true)
    }

    /// Sort direction for a column, if it takes part in sorting.
    pub fn sort_direction(&self, column_id: &str) -> Option<bool> {
        self.sorting
            .iter()
            .find(|spec| spec.id == column_id)
            .map(|spec| spec.desc)
    }

    /// Checks that the snapshot is one the builder can project.
    ///
    /// The builder itself never calls this: it skips unknown sort keys. Hosts
    /// that construct snapshots by hand can use it to catch mistakes early.
    pub fn validate<R: Record>(&self, schema: &ColumnSchema<R>) -> Result<()> {
        if self.pagination.page_size == 0 {
            return Err(Error::ZeroPageSize);
        }
        if let Some(spec) = self.sorting.iter().find(|spec| !schema.contains(&spec.id)) {
            return Err(Error::UnknownSortColumn {
                id: spec.id.clone(),
            });
        }
        Ok(())
    }
}

/// A state transition the builder requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    SetPageIndex(usize),
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    /// Changes the page size, keeping the first visible row on screen.
    SetPageSize(usize),
    /// Cycles a column through ascending, descending and unsorted.
    ///
    /// With `multi`, other sort keys are kept and the column is appended;
    /// otherwise it replaces them.
    ToggleSort { column_id: String, multi: bool },
    SetSorting(Vec<SortSpec>),
    ClearSorting,
    SetColumnVisibility { column_id: String, visible: bool },
    /// Returns to the builder's initial state.
    Reset,
}

/// A pending state transition, handed to whoever owns the state.
///
/// Carries everything needed to compute the next snapshot from any previous
/// one, so a controlled host can apply it to its own stored state.
#[derive(Debug, Clone)]
pub struct Updater {
    update: StateUpdate,
    row_count: usize,
    initial: TableState,
}

impl Updater {
    pub(crate) fn new(update: StateUpdate, row_count: usize, initial: TableState) -> Self {
        Self {
            update,
            row_count,
            initial,
        }
    }

    /// The requested transition.
    pub fn update(&self) -> &StateUpdate {
        &self.update
    }

    /// Computes the next snapshot from `prev`.
    pub fn apply(&self, prev: &TableState) -> TableState {
        let mut next = prev.clone();
        let pagination = &mut next.pagination;
        let last_page = pagination.page_count(self.row_count) - 1;

        match &self.update {
            StateUpdate::SetPageIndex(index) => pagination.page_index = (*index).min(last_page),
            StateUpdate::NextPage => {
                pagination.page_index = (pagination.clamped_index(self.row_count) + 1).min(last_page)
            }
            StateUpdate::PreviousPage => {
                pagination.page_index = pagination.clamped_index(self.row_count).saturating_sub(1)
            }
            StateUpdate::FirstPage => pagination.page_index = 0,
            StateUpdate::LastPage => pagination.page_index = last_page,
            StateUpdate::SetPageSize(size) => {
                let size = (*size).max(1);
                let top_row = pagination.clamped_index(self.row_count) * pagination.page_size;
                pagination.page_size = size;
                pagination.page_index = top_row / size;
            }
            StateUpdate::ToggleSort { column_id, multi } => {
                next.sorting = toggle_sort(&prev.sorting, column_id, *multi);
            }
            StateUpdate::SetSorting(sorting) => next.sorting = sorting.clone(),
            StateUpdate::ClearSorting => next.sorting.clear(),
            StateUpdate::SetColumnVisibility { column_id, visible } => {
                next.column_visibility.insert(column_id.clone(), *visible);
            }
            StateUpdate::Reset => next = self.initial.clone(),
        }
        next
    }
}

fn toggle_sort(sorting: &[SortSpec], column_id: &str, multi: bool) -> Vec<SortSpec> {
    let current = sorting.iter().find(|spec| spec.id == column_id);
    let next = match current {
        None => Some(SortSpec::asc(column_id)),
        Some(spec) if !spec.desc => Some(SortSpec::desc(column_id)),
        Some(_) => None,
    };

    if !multi {
        return next.into_iter().collect();
    }

    let mut sorting: Vec<SortSpec> = sorting.to_vec();
    match (sorting.iter().position(|spec| spec.id == column_id), next) {
        (Some(pos), Some(spec)) => sorting[pos] = spec,
        (Some(pos), None) => {
            sorting.remove(pos);
        }
        (None, Some(spec)) => sorting.push(spec),
        (None, None) => {}
    }
    sorting
}
