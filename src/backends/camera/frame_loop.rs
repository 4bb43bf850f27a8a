// SPDX-License-Identifier: GPL-3.0-only
//! Paint-tick driven frame loops
//!
//! A frame loop runs one step per display refresh: the step awaits a single
//! detect/decode, then the loop awaits the next tick from a [`FrameClock`].
//! There is never more than one step in flight. Cancellation goes through a
//! shared [`LoopToken`] that the step re-checks after every await, so a
//! result that arrives after `stop()` is discarded instead of acted on.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Action returned by a loop step to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Schedule the next step on the next paint tick
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Display refresh signal
pub trait FrameClock: Send + Sync {
    /// Resolve on the next paint tick
    fn next_tick(&self) -> BoxFuture<'_, ()>;
}

/// Frame clock backed by a tokio interval, for hosts without a compositor
/// refresh callback
pub struct IntervalFrameClock {
    period: Duration,
    interval: tokio::sync::Mutex<Option<Interval>>,
}

impl IntervalFrameClock {
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / refresh_hz.max(1) as f64),
            interval: tokio::sync::Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameClock for IntervalFrameClock {
    fn next_tick(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut guard = self.interval.lock().await;
            // Created lazily: intervals need a running runtime
            let interval = guard.get_or_insert_with(|| {
                let mut interval = tokio::time::interval(self.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                interval
            });
            interval.tick().await;
        })
    }
}

/// Liveness token shared between a loop and its owner
#[derive(Debug, Clone, Default)]
pub struct LoopToken(Arc<AtomicBool>);

impl LoopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every continuation holding this token
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        !self.is_stopped()
    }
}

/// One iteration of a frame loop
pub trait FrameStep: Send {
    fn step(&mut self) -> BoxFuture<'_, LoopAction>;
}

/// Controller for a frame loop running as a tokio task
///
/// ```ignore
/// let token = LoopToken::new();
/// let frame_loop = FrameLoopController::spawn("barcode-scan", clock, token.clone(), step);
///
/// // Later
/// frame_loop.stop();
/// ```
pub struct FrameLoopController {
    task: Option<JoinHandle<()>>,
    token: LoopToken,
    name: String,
}

impl FrameLoopController {
    /// Spawn the loop on the current tokio runtime
    ///
    /// The first step runs immediately; each following step waits for the
    /// next paint tick. The loop exits when the step returns
    /// [`LoopAction::Stop`] or the token is stopped.
    pub fn spawn<S>(name: &str, clock: Arc<dyn FrameClock>, token: LoopToken, mut step: S) -> Self
    where
        S: FrameStep + 'static,
    {
        let loop_token = token.clone();
        let name_clone = name.to_string();

        info!(name = %name, "Starting frame loop");

        let task = tokio::spawn(async move {
            loop {
                if loop_token.is_stopped() {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                if step.step().await == LoopAction::Stop {
                    debug!(name = %name_clone, "Loop requested stop");
                    break;
                }

                if loop_token.is_stopped() {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                clock.next_tick().await;
            }

            info!(name = %name_clone, "Frame loop exiting");
        });

        Self {
            task: Some(task),
            token,
            name: name.to_string(),
        }
    }

    /// Check if the loop task is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Invalidate the token and cancel the pending tick
    ///
    /// A step that is mid-await is dropped with the task; its result never
    /// reaches the owner.
    pub fn stop(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        self.token.stop();
        if let Some(task) = self.task.take() {
            debug!(name = %self.name, "Cancelling frame loop");
            task.abort();
        }
    }
}

impl Drop for FrameLoopController {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for FrameLoopController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoopController")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct YieldClock;

    impl FrameClock for YieldClock {
        fn next_tick(&self) -> BoxFuture<'_, ()> {
            Box::pin(tokio::task::yield_now())
        }
    }

    struct CountingStep {
        count: Arc<AtomicUsize>,
        stop_after: Option<usize>,
    }

    impl FrameStep for CountingStep {
        fn step(&mut self) -> BoxFuture<'_, LoopAction> {
            Box::pin(async move {
                let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
                match self.stop_after {
                    Some(limit) if n >= limit => LoopAction::Stop,
                    _ => LoopAction::Continue,
                }
            })
        }
    }

    #[tokio::test]
    async fn test_loop_stops_when_step_requests() {
        let count = Arc::new(AtomicUsize::new(0));
        let step = CountingStep {
            count: Arc::clone(&count),
            stop_after: Some(3),
        };
        let mut controller =
            FrameLoopController::spawn("test", Arc::new(YieldClock), LoopToken::new(), step);

        let task = controller.task.take().unwrap();
        task.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_steps_after_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let step = CountingStep {
            count: Arc::clone(&count),
            stop_after: None,
        };
        let token = LoopToken::new();
        let controller =
            FrameLoopController::spawn("test", Arc::new(YieldClock), token.clone(), step);

        while count.load(Ordering::SeqCst) < 5 {
            tokio::task::yield_now().await;
        }
        controller.stop();
        assert!(token.is_stopped());

        let at_stop = count.load(Ordering::SeqCst);
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(count.load(Ordering::SeqCst), at_stop);
    }

    #[tokio::test]
    async fn test_interval_clock_ticks() {
        let clock = IntervalFrameClock::new(1000);
        assert_eq!(clock.period(), Duration::from_millis(1));
        clock.next_tick().await;
        clock.next_tick().await;
    }
}
