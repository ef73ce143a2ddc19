//! Type aliases for commonly used shared-state types.
//!
//! The motion core is single-threaded and cooperative; interactive owners
//! (collections, editors) share mutable variants through `Rc<RefCell<T>>`,
//! while the event bus and cancellation paths use `Arc`-based types.

use parking_lot::{Mutex, RwLock};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
///
/// Variant collections hand out `Shared<CutVariant>` handles so that an
/// editor can mutate a variant in place while the collection retains it.
pub type Shared<T> = Rc<RefCell<T>>;

/// An optional shared reference, for lazily-initialized shared state.
pub type SharedOption<T> = Rc<RefCell<Option<T>>>;

/// A shared vector for single-threaded collection management.
pub type SharedVec<T> = Rc<RefCell<Vec<T>>>;

/// Thread-safe shared state behind a mutex.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// Thread-safe shared state behind a reader-writer lock.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// Construct a [`Shared`] value.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Construct a [`ThreadSafe`] value.
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}
