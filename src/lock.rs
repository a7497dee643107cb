//! Reentrancy lock for mutating pool operations

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::PoolError;

/// Busy flag shared by every handle to the same pool
///
/// Clones observe the same flag, so a collaborator holding a handle can
/// see (and is refused) an in-flight operation.
#[derive(Debug, Clone, Default)]
pub struct TradeLock {
    busy: Arc<AtomicBool>,
}

impl TradeLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or fail with `PoolError::Reentrant` if it is held
    pub fn acquire(&self) -> Result<LockGuard, PoolError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(PoolError::Reentrant);
        }
        Ok(LockGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Releases the lock when dropped, on every exit path
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
