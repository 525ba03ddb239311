use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("encoder gate is full ({capacity} permits)")]
    Full { capacity: usize },

    #[error("encoder gate is closed")]
    Closed,
}

/// Bounds queued plus running encodes.
///
/// A permit is held for the whole encode, including while it waits on the model
/// mutex. Request paths use [`try_enter`](Self::try_enter) and fail fast when full.
#[derive(Debug)]
pub struct EncoderGate {
    permits: Arc<Semaphore>,
    capacity: usize,
    closing: AtomicBool,
}

impl EncoderGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS.min(u32::MAX as usize));
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            closing: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Takes a permit without waiting.
    pub fn try_enter(&self) -> Result<OwnedSemaphorePermit, GateError> {
        if self.is_closed() {
            return Err(GateError::Closed);
        }
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::NoPermits => GateError::Full {
                    capacity: self.capacity,
                },
                TryAcquireError::Closed => GateError::Closed,
            })
    }

    /// Waits for a permit. Used by background work such as rebuilds.
    pub async fn enter(&self) -> Result<OwnedSemaphorePermit, GateError> {
        if self.is_closed() {
            return Err(GateError::Closed);
        }
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| GateError::Closed)
    }

    /// Stops admitting work and waits until every permit has been returned.
    pub async fn drain(&self) {
        self.closing.store(true, Ordering::SeqCst);
        // capacity fits in u32 (clamped in new)
        let _ = self.permits.acquire_many(self.capacity as u32).await;
        self.permits.close();
    }
}
