use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::ReferenceIndex;

/// Shared pointer to the current [`ReferenceIndex`], swappable as a whole.
///
/// Readers take a cheap `Arc` snapshot and score against it without holding any lock,
/// so a swap never tears a read: in-flight requests finish on the index they started
/// with, new requests see the replacement.
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<ReferenceIndex>>,
    generation: AtomicU64,
}

impl IndexHandle {
    pub fn new(index: ReferenceIndex) -> Self {
        Self::from_arc(Arc::new(index))
    }

    pub fn from_arc(index: Arc<ReferenceIndex>) -> Self {
        Self {
            current: RwLock::new(index),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns a snapshot of the current index.
    #[inline]
    pub fn load(&self) -> Arc<ReferenceIndex> {
        Arc::clone(&self.current.read())
    }

    /// Installs `next` and returns the index it replaced.
    pub fn swap(&self, next: Arc<ReferenceIndex>) -> Arc<ReferenceIndex> {
        let mut current = self.current.write();
        let previous = std::mem::replace(&mut *current, next);
        self.generation.fetch_add(1, Ordering::SeqCst);
        previous
    }

    /// Number of swaps performed since construction.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
