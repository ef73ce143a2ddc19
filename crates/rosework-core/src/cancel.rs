//! Cooperative cancellation for long-running operations.
//!
//! Full-surface cut simulation and large spiral discretization check a
//! [`CancelToken`] once per outer iteration (per cut point, per repeat) and
//! return partial results on cancellation. The token is cheap to clone and
//! safe to hand to another thread or a UI callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Observers see the flag on their next check.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        tracing::debug!("Cancellation requested");
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
