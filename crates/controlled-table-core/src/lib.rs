//! Reactive primitives shared by the Controlled Table crates.
//!
//! - [`Signal`]: synchronous notification with connect/disconnect by id
//! - [`Property`]: an owned value whose `set` reports whether it changed
//! - [`Binding`]: a derived value cached until invalidated
//! - [`logging`]: tracing targets, span names and [`PerfSpan`]
//!
//! The table layers compose these the same way throughout: an owner stores
//! state in a `Property`, emits a `Signal` when `set` returns `true`, and
//! dependents invalidate a `Binding` from a connected slot.
//!
//! ```
//! use controlled_table_core::{Binding, Property, Signal};
//! use std::sync::Arc;
//!
//! let rows = Arc::new(Property::new(vec![1, 2, 3]));
//! let rows_changed = Signal::<()>::new();
//!
//! let source = rows.clone();
//! let total = Arc::new(Binding::new(move || source.with(|r| r.iter().sum::<i32>())));
//!
//! let stale = total.clone();
//! rows_changed.connect(move |_| stale.invalidate());
//!
//! assert_eq!(total.get(), 6);
//! if rows.set(vec![10, 20]) {
//!     rows_changed.emit(());
//! }
//! assert_eq!(total.get(), 30);
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::PerfSpan;
pub use property::{Binding, Property, ReadOnlyProperty};
pub use signal::{ConnectionId, Signal};
