//! The controlled state bridge.
//!
//! [`ControlledState`] lifts the view-model's projection state into a
//! host-owned [`Property`]. It is seeded from the builder's own declared
//! initial state, supplies that snapshot plus a state-change handler on every
//! [`ControlledState::sync`], and applies each [`Updater`] the builder hands
//! back to the stored snapshot.
//!
//! ```
//! use std::sync::Arc;
//! use controlled_table::{
//!     person_columns, ControlledState, Person, RowStore, StateUpdate, TableState,
//!     ViewModelBuilder,
//! };
//!
//! let schema = Arc::new(person_columns().unwrap());
//! let rows = (0..30).map(|i| Person::new("A", "B", i, 0, "single", 0)).collect();
//! let builder = ViewModelBuilder::new(Arc::new(RowStore::new(schema, rows)), TableState::default());
//!
//! let bridge = ControlledState::seeded_from(&builder);
//! bridge.sync(&builder);
//!
//! builder.dispatch(StateUpdate::NextPage);
//! assert_eq!(bridge.state().pagination.page_index, 1);
//!
//! bridge.sync(&builder);
//! assert_eq!(builder.view().page_index, 1);
//! ```

use std::fmt;
use std::sync::Arc;

use controlled_table_core::logging::targets;
use controlled_table_core::{Property, ReadOnlyProperty, Signal};

use crate::record::Record;
use crate::state::{TableState, Updater};
use crate::view_model::{StateChangeHandler, TableOptions, ViewModelBuilder};

/// Host-owned projection state.
#[derive(Clone)]
pub struct ControlledState {
    state: Arc<Property<TableState>>,
    state_changed: Arc<Signal<TableState>>,
}

impl ControlledState {
    /// Seeds the host state from the builder's declared initial state.
    pub fn seeded_from<R: Record>(builder: &ViewModelBuilder<R>) -> Self {
        let initial = builder.initial_state().clone();
        tracing::debug!(target: targets::BRIDGE, ?initial, "bridge seeded from builder");
        Self {
            state: Arc::new(Property::new(initial)),
            state_changed: Arc::new(Signal::new()),
        }
    }

    /// The current host snapshot.
    pub fn state(&self) -> TableState {
        self.state.get()
    }

    /// Read access to the host snapshot without the ability to replace it.
    pub fn property(&self) -> ReadOnlyProperty<'_, TableState> {
        ReadOnlyProperty::new(&self.state)
    }

    /// Signal emitted whenever the host snapshot changes.
    pub fn state_changed(&self) -> &Arc<Signal<TableState>> {
        &self.state_changed
    }

    /// The callback handed to the builder as `on_state_change`.
    pub fn handler(&self) -> StateChangeHandler {
        let state = self.state.clone();
        let state_changed = self.state_changed.clone();
        Arc::new(move |updater: Updater| {
            let next = updater.apply(&state.get());
            if state.set(next.clone()) {
                tracing::debug!(
                    target: targets::BRIDGE,
                    update = ?updater.update(),
                    page_index = next.pagination.page_index,
                    "host state updated"
                );
                state_changed.emit(next);
            }
        })
    }

    /// Supplies the builder with the host snapshot and the handler.
    ///
    /// Every other option is carried over from the builder's previous options.
    pub fn sync<R: Record>(&self, builder: &ViewModelBuilder<R>) {
        let state = self.state();
        let handler = self.handler();
        builder.set_options(move |prev| TableOptions {
            state: Some(state),
            on_state_change: Some(handler),
            ..prev.clone()
        });
    }

    /// Replaces the host snapshot directly, as a host-driven override.
    ///
    /// The snapshot must have the builder's shape; sort keys for unknown
    /// columns are skipped during projection. Returns `true` if it changed.
    pub fn override_state(&self, state: TableState) -> bool {
        if self.state.set(state.clone()) {
            tracing::debug!(target: targets::BRIDGE, "host state overridden");
            self.state_changed.emit(state);
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for ControlledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlledState")
            .field("state", &self.state.get())
            .finish()
    }
}
