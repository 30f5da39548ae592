//! Poll pacing.
//!
//! The poll loops never sleep directly; they go through a [`Delay`] (async) or
//! [`BlockingDelay`] (sync) so tests can observe the requested intervals
//! without waiting for them.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// A boxed future type for async delays and tool handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Async sleep source used between status polls.
pub trait Delay: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Sleeps on the Tokio timer.
#[cfg(feature = "client")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[cfg(feature = "client")]
impl Delay for TokioDelay {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Blocking sleep source used between status polls.
pub trait BlockingDelay: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Parks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl BlockingDelay for ThreadDelay {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Cooperative cancellation flag checked by the poll loop after each sleep.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
