//! Synchronous change notification between table layers.
//!
//! The row store announces commits and resets, the change log announces its
//! latest entry, and the state bridge announces each new host snapshot. A
//! [`Signal`] runs every connected slot on the emitting thread before
//! [`Signal::emit`] returns, so one table event is fully observed before the
//! next one starts.
//!
//! ```
//! use controlled_table_core::Signal;
//! use std::sync::{Arc, Mutex};
//!
//! let page_changed = Signal::<usize>::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = seen.clone();
//! let id = page_changed.connect(move |page| sink.lock().unwrap().push(*page));
//!
//! page_changed.emit(1);
//! page_changed.disconnect(id);
//! page_changed.emit(2);
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle for one connected slot, passed back to [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of slots invoked in connection order on every emission.
///
/// `Args` is the payload type; tuples carry several values, e.g.
/// `Signal<(usize, String)>` for a row index and a column id.
///
/// The slot list is copied before any slot runs. A slot may therefore emit
/// other signals, or connect and disconnect on this one, without deadlocking;
/// slots connected mid-emission first run on the following emission.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Adds `slot` and returns the id that removes it again.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.slots.lock().insert(Arc::new(slot));
        tracing::trace!(target: targets::SIGNAL, ?id, "slot connected");
        id
    }

    /// Removes one slot. Returns `false` if `id` was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.slots.lock().remove(id).is_some();
        tracing::trace!(target: targets::SIGNAL, ?id, removed, "slot disconnected");
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Runs every connected slot with `args` and returns how many ran.
    #[tracing::instrument(skip_all, target = "controlled_table_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        let snapshot: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, slots = snapshot.len(), "emit");
        snapshot.iter().for_each(|slot| slot(&args));
        snapshot.len()
    }
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.lock().len())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<(usize, String)>: Send, Sync);
static_assertions::assert_impl_all!(Signal<u64>: Send, Sync, Default);

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>(
        signal: &Signal<T>,
    ) -> (ConnectionId, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = signal.connect(move |value: &T| sink.lock().push(value.clone()));
        (id, seen)
    }

    #[test]
    fn test_slots_run_in_connection_order() {
        let reset = Signal::<u64>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["store", "view", "editor"] {
            let order = order.clone();
            reset.connect(move |generation| order.lock().push((name, *generation)));
        }

        assert_eq!(reset.emit(7), 3);
        assert_eq!(
            *order.lock(),
            vec![("store", 7), ("view", 7), ("editor", 7)]
        );
    }

    #[test]
    fn test_disconnect_stops_delivery() {
        let data_changed = Signal::<(usize, String)>::new();
        let (id, seen) = recorder(&data_changed);

        data_changed.emit((0, "firstName".into()));
        assert!(data_changed.disconnect(id));
        assert!(!data_changed.disconnect(id));
        data_changed.emit((1, "age".into()));

        assert_eq!(*seen.lock(), vec![(0, "firstName".to_string())]);
        assert_eq!(data_changed.connection_count(), 0);
    }

    #[test]
    fn test_emit_without_slots() {
        let signal = Signal::<()>::default();
        assert_eq!(signal.emit(()), 0);
    }

    #[test]
    fn test_slot_may_emit_and_connect_during_emission() {
        let committed = Arc::new(Signal::<usize>::new());
        let logged = Arc::new(Signal::<String>::new());
        let (_, lines) = recorder(&logged);

        let forward = logged.clone();
        committed.connect(move |row| {
            forward.emit(format!("Row index: {row}"));
        });
        let reconnect = committed.clone();
        committed.connect(move |_| {
            reconnect.connect(|_| {});
        });

        assert_eq!(committed.emit(4), 2);
        assert_eq!(*lines.lock(), vec!["Row index: 4".to_string()]);
        assert_eq!(committed.connection_count(), 3);
    }
}
