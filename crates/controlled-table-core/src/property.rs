//! Host-owned values and the memoized values derived from them.
//!
//! A controlled table keeps two kinds of state: values somebody owns (the
//! row snapshot, the projection state, the latest change-log entry) and
//! values computed from them (the current page view). [`Property`] holds the
//! first kind and reports on `set` whether anything changed, so the owner
//! decides when to notify. [`Binding`] holds the second kind and recomputes
//! only after someone marks it stale.
//!
//! ```
//! use controlled_table_core::{Property, Signal};
//!
//! struct PageSize {
//!     size: Property<usize>,
//!     size_changed: Signal<usize>,
//! }
//!
//! impl PageSize {
//!     fn resize(&self, size: usize) {
//!         if self.size.set(size) {
//!             self.size_changed.emit(size);
//!         }
//!     }
//! }
//!
//! let page = PageSize { size: Property::new(10), size_changed: Signal::new() };
//! page.resize(25);
//! assert_eq!(page.size.get(), 25);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::logging::targets;

/// A shared value with change detection.
pub struct Property<T> {
    cell: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(initial: T) -> Self {
        Self {
            cell: RwLock::new(initial),
        }
    }

    /// A clone of the stored value. Prefer [`Property::with`] for reads that
    /// only inspect part of a large value.
    pub fn get(&self) -> T {
        T::clone(&self.cell.read())
    }

    /// Runs `read` against the stored value while holding the read lock.
    pub fn with<F, O>(&self, read: F) -> O
    where
        F: FnOnce(&T) -> O,
    {
        let guard = self.cell.read();
        read(&guard)
    }

    /// Overwrites the stored value without comparing it to the old one.
    ///
    /// Used where the caller already knows the value is new, such as a row
    /// snapshot built from scratch.
    pub fn set_silent(&self, next: T) {
        let mut guard = self.cell.write();
        *guard = next;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Stores `next` if it differs from the current value.
    ///
    /// Returns `true` when the stored value changed; the owner emits its
    /// notification only in that case.
    pub fn set(&self, next: T) -> bool {
        let mut guard = self.cell.write();
        let changed = *guard != next;
        if changed {
            *guard = next;
        }
        tracing::trace!(target: targets::PROPERTY, changed, "property set");
        changed
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.cell.read()).finish()
    }
}

/// Borrowed read access to a [`Property`].
///
/// Handed to observers so that only the owner can write.
pub struct ReadOnlyProperty<'a, T> {
    source: &'a Property<T>,
}

impl<'a, T: Clone> ReadOnlyProperty<'a, T> {
    pub fn new(source: &'a Property<T>) -> Self {
        Self { source }
    }

    pub fn get(&self) -> T {
        self.source.get()
    }

    pub fn with<F, O>(&self, read: F) -> O
    where
        F: FnOnce(&T) -> O,
    {
        self.source.with(read)
    }
}

/// A value derived on demand and cached until marked stale.
///
/// The derivation runs on the first [`Binding::get`] and then again on the
/// first `get` after each [`Binding::invalidate`]. Each run bumps
/// [`Binding::revision`], so two reads with the same revision saw the same
/// derived value.
///
/// ```
/// use controlled_table_core::{Binding, Property};
/// use std::sync::Arc;
///
/// let rows = Arc::new(Property::new(vec![3, 1, 2]));
/// let source = rows.clone();
/// let sorted = Binding::new(move || {
///     let mut rows = source.get();
///     rows.sort();
///     rows
/// });
///
/// assert_eq!(sorted.get(), vec![1, 2, 3]);
/// rows.set_silent(vec![9, 8]);
/// assert_eq!(sorted.get(), vec![1, 2, 3]);
/// sorted.invalidate();
/// assert_eq!(sorted.get(), vec![8, 9]);
/// assert_eq!(sorted.revision(), 2);
/// ```
pub struct Binding<T> {
    derive: Box<dyn Fn() -> T + Send + Sync>,
    memo: RwLock<Option<T>>,
    stale: AtomicBool,
    revision: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> Binding<T> {
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            derive: Box::new(derive),
            memo: RwLock::new(None),
            stale: AtomicBool::new(true),
            revision: AtomicU64::new(0),
        }
    }

    /// The cached value, deriving it first if the cache is stale.
    pub fn get(&self) -> T {
        if !self.is_dirty() {
            if let Some(value) = &*self.memo.read() {
                return value.clone();
            }
        }

        let mut memo = self.memo.write();
        // Another reader may have derived the value while we waited.
        if !self.stale.swap(false, Ordering::AcqRel) {
            if let Some(value) = &*memo {
                return value.clone();
            }
        }
        let value = (self.derive)();
        *memo = Some(value.clone());
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(target: targets::PROPERTY, revision, "binding derived");
        value
    }

    /// Marks the cache stale. The next `get` derives a fresh value.
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// How many times the derivation has run.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Invalidates and derives immediately.
    pub fn refresh(&self) -> T {
        self.invalidate();
        self.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("stale", &self.stale.load(Ordering::Acquire))
            .field("revision", &self.revision.load(Ordering::Acquire))
            .field("memo", &*self.memo.read())
            .finish()
    }
}
