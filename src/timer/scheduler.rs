use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub type TickCallback = Box<dyn FnMut() + Send + 'static>;

/// A periodic time source. The timer never keeps time itself; something
/// implementing this calls back into it at a fixed interval.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, callback: TickCallback, interval: Duration) -> ScheduleHandle;
}

/// Cancels the scheduled callback when `cancel` is called or the handle is dropped.
#[derive(Debug)]
pub struct ScheduleHandle {
    token: CancellationToken,
}

impl ScheduleHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Runs callbacks on a tokio interval task.
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Uses the runtime of the calling context. Panics outside a runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, mut callback: TickCallback, interval: Duration) -> ScheduleHandle {
        let token = CancellationToken::new();
        let cancel_token = token.clone();

        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; a full interval must pass
            // before time advances.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        log_debug!("tick source cancelled");
                        break;
                    }
                    _ = ticker.tick() => callback(),
                }
            }
        });

        ScheduleHandle::new(token)
    }
}
