//! Periodic token refresh task
//!
//! One background task at most: arming replaces any running task, disarming
//! is idempotent, and dropping the scheduler cancels whatever is running.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::DEFAULT_REFRESH_INTERVAL;

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Cancellable fixed-interval task runner
///
/// Ticks run to completion inside the task, so one tick never overlaps the
/// next.
pub struct RefreshScheduler {
    interval: Duration,
    running: Mutex<Option<RunningTask>>,
}

impl RefreshScheduler {
    /// Create a disarmed scheduler
    ///
    /// A zero interval would tick back to back, so it is replaced by
    /// [`DEFAULT_REFRESH_INTERVAL`].
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                default_secs = DEFAULT_REFRESH_INTERVAL.as_secs(),
                "Zero refresh interval; using default"
            );
            DEFAULT_REFRESH_INTERVAL
        } else {
            interval
        };
        Self { interval, running: Mutex::new(None) }
    }

    /// Interval between ticks
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking every interval, replacing any running task
    ///
    /// A tick returning `ControlFlow::Break` ends the task. Must be called
    /// from within a Tokio runtime.
    pub fn arm<F, Fut>(&self, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(self.interval, cancel.clone(), tick));

        // The replaced task may be the caller itself, so it is cancelled
        // rather than aborted or awaited.
        if let Some(previous) = self.running.lock().replace(RunningTask { cancel, handle }) {
            previous.cancel.cancel();
        }
        debug!(interval_secs = self.interval.as_secs(), "Periodic refresh armed");
    }

    /// Stop ticking; no-op when already stopped
    pub fn disarm(&self) {
        if let Some(previous) = self.running.lock().take() {
            previous.cancel.cancel();
            debug!("Periodic refresh disarmed");
        }
    }

    /// True while a task is live and not cancelled
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|task| !task.cancel.is_cancelled() && !task.handle.is_finished())
    }
}

async fn tick_loop<F, Fut>(interval: Duration, cancel: CancellationToken, tick: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = ControlFlow<()>>,
{
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Periodic refresh loop cancelled");
                break;
            }
            () = tokio::time::sleep(interval) => {
                if tick().await.is_break() {
                    break;
                }
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.running.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("interval", &self.interval)
            .field("armed", &self.is_armed())
            .finish()
    }
}
