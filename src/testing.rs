//! Helpers for deterministic tests against a mock orchestrator.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

#[cfg(feature = "blocking")]
use crate::BlockingConfig;
#[cfg(feature = "client")]
use crate::Config;
use crate::delay::{BlockingDelay, BoxFuture, CancelHandle, Delay};

/// API key used by the test configs.
pub const TEST_API_KEY: &str = "em_test_key";

/// Poll interval used by the test configs. Never actually waited for.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// A delay source that records each requested sleep and returns immediately.
///
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    cancel_after: Option<(usize, CancelHandle)>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `handle` once `sleeps` sleeps have been recorded.
    pub fn cancel_after(mut self, sleeps: usize, handle: CancelHandle) -> Self {
        self.cancel_after = Some((sleeps, handle));
        self
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.log().clone()
    }

    pub fn count(&self) -> usize {
        self.log().len()
    }

    /// Simulated time spent sleeping.
    pub fn elapsed(&self) -> Duration {
        self.log().iter().sum()
    }

    fn record(&self, duration: Duration) {
        let count = {
            let mut log = self.log();
            log.push(duration);
            log.len()
        };
        if let Some((after, handle)) = &self.cancel_after {
            if count >= *after {
                handle.cancel();
            }
        }
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Vec<Duration>> {
        self.sleeps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Delay for RecordingDelay {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.record(duration);
        Box::pin(std::future::ready(()))
    }
}

impl BlockingDelay for RecordingDelay {
    fn sleep(&self, duration: Duration) {
        self.record(duration);
    }
}

/// Async config pointed at `base_url`, with a test key and `delay` for pacing.
#[cfg(feature = "client")]
pub fn test_config(base_url: &str, delay: &RecordingDelay) -> Config {
    Config {
        base_url: Some(base_url.to_string()),
        api_key: Some(TEST_API_KEY.to_string()),
        timeout: Some(Duration::from_secs(5)),
        poll_interval: Some(TEST_POLL_INTERVAL),
        delay: Some(Arc::new(delay.clone())),
        ..Default::default()
    }
}

/// Blocking counterpart of [`test_config`].
#[cfg(feature = "blocking")]
pub fn test_blocking_config(base_url: &str, delay: &RecordingDelay) -> BlockingConfig {
    BlockingConfig {
        base_url: Some(base_url.to_string()),
        api_key: Some(TEST_API_KEY.to_string()),
        timeout: Some(Duration::from_secs(5)),
        poll_interval: Some(TEST_POLL_INTERVAL),
        delay: Some(Arc::new(delay.clone())),
        ..Default::default()
    }
}

/// A base URL on which nothing is listening.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0");
    let port = listener
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .unwrap_or(9);
    format!("http://127.0.0.1:{port}")
}
