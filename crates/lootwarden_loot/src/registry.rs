//! Published snapshots.
//!
//! Readers take a cheap `Arc` clone of the current value; reload builds a new
//! value off to the side and swaps it in. A reader never observes a partially
//! reloaded table.

use std::sync::Arc;

use parking_lot::RwLock;

/// An atomically replaceable shared value.
#[derive(Debug, Default)]
pub struct Registry<T> {
    current: RwLock<Arc<T>>,
}

impl<T> Registry<T> {
    /// Publishes the initial value.
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the published value, returning the previous one.
    pub fn replace(&self, value: T) -> Arc<T> {
        std::mem::replace(&mut *self.current.write(), Arc::new(value))
    }
}
