//! Cancellation of blocking motions

use core::sync::atomic::{AtomicBool, Ordering};

/// Abort flag for blocking motions
///
/// Stall-seeking runs and the retraction poll loop check this flag on every
/// iteration. It can be set from another thread or an interrupt handler, so
/// it is usually placed in a `static`:
///
/// ```
/// use catapult_core::motion::CancelToken;
///
/// static ESTOP: CancelToken = CancelToken::new();
///
/// ESTOP.cancel();
/// assert!(ESTOP.is_cancelled());
/// ```
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    /// Request cancellation of the current (or next) blocking motion
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Clear a pending cancellation
    pub fn clear(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}
