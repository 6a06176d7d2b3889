//! Cooperative cancellation context threaded through every operator entry
//! point. A single [`Context`] is created per query and cloned
//! into every worker-pool job and iterator that wants to observe
//! cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation / timeout handle for a single query execution.
///
/// Cloning shares the underlying flag: cancelling any clone cancels all of
/// them. Operators call [`Context::check`] at iteration boundaries (not
/// inside a tight inner loop) so that in-flight rows finish but no new unit
/// of work starts once cancellation is observed.
#[derive(Clone)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    start_time: Instant,
    timeout: Option<Duration>,
}

impl Context {
    pub fn new(timeout: Option<Duration>) -> Self {
        Context {
            cancelled: Arc::new(AtomicBool::new(false)),
            start_time: Instant::now(),
            timeout,
        }
    }

    /// A context that never times out and is not pre-cancelled. Suitable
    /// for tests and for callers that manage cancellation externally.
    pub fn background() -> Self {
        Context::new(None)
    }

    /// Returns `Ok(())` if execution may continue, or
    /// [`crate::error::ExecError::Cancelled`] once cancellation has been
    /// requested or the timeout has elapsed.
    pub fn check(&self) -> Result<(), crate::error::ExecError> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(crate::error::ExecError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            if self.start_time.elapsed() > timeout {
                self.cancelled.store(true, Ordering::Relaxed);
                return Err(crate::error::ExecError::Cancelled);
            }
        }
        Ok(())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// A handle that can be sent to another thread (e.g. a worker-pool
    /// job) to cancel this context independently of holding the `Context`
    /// itself.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::background()
    }
}

#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
