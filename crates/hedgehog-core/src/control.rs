//! Shared run control for the pipeline loop.
//!
//! [`RunControl`] is wrapped in an [`Arc`](std::sync::Arc) and shared
//! between the pipeline task, the operator console, and the ctrl-c handler.
//! The stop flag is atomic so the loop can check it without locking; the
//! [`Notify`] wakes the loop out of its inter-cycle sleep.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

/// Why the run loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEndReason {
    /// Attacker health reached zero.
    Victory,
    /// Panic reached the maximum.
    Defeat,
    /// The configured `max_cycles` limit was reached.
    MaxCyclesReached,
    /// The event source has no more events.
    SourceExhausted,
    /// An operator or signal requested a stop.
    OperatorStop,
}

impl core::fmt::Display for RunEndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Victory => "victory",
            Self::Defeat => "defeat",
            Self::MaxCyclesReached => "max_cycles_reached",
            Self::SourceExhausted => "source_exhausted",
            Self::OperatorStop => "operator_stop",
        };
        f.write_str(name)
    }
}

/// Stop flag, cycle counter, and end reason shared across tasks.
#[derive(Debug)]
pub struct RunControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the loop out of its inter-cycle sleep.
    stop_notify: Notify,

    /// Cycles completed so far.
    cycles: AtomicU64,

    /// When the run started.
    started_at: DateTime<Utc>,

    /// Reason the run ended, if it has.
    end_reason: Mutex<Option<RunEndReason>>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    /// Fresh control state for a run starting now.
    pub fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            cycles: AtomicU64::new(0),
            started_at: Utc::now(),
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The current cycle finishes first.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested. Returns immediately if one already was.
    pub async fn stopped(&self) {
        loop {
            let notified = self.stop_notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent
            // `request_stop` cannot slip between the two.
            notified.as_mut().enable();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Record a completed cycle.
    pub fn record_cycle(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    /// Cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// When the run started.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record the reason the run ended.
    pub async fn set_end_reason(&self, reason: RunEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// The reason the run ended, if it has.
    pub async fn end_reason(&self) -> Option<RunEndReason> {
        *self.end_reason.lock().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stop_wakes_a_waiting_task() {
        let control = Arc::new(RunControl::new());
        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.stopped().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        control.request_stop();
        assert!(tokio::time::timeout(Duration::from_secs(1), waiter).await.is_ok());
        assert!(control.is_stop_requested());
    }

    #[tokio::test]
    async fn stopped_returns_immediately_after_stop() {
        let control = RunControl::new();
        control.request_stop();
        control.stopped().await;
    }

    #[tokio::test]
    async fn end_reason_round_trip() {
        let control = RunControl::new();
        assert_eq!(control.end_reason().await, None);
        control.set_end_reason(RunEndReason::SourceExhausted).await;
        assert_eq!(control.end_reason().await, Some(RunEndReason::SourceExhausted));
    }

    #[test]
    fn cycles_count_up() {
        let control = RunControl::new();
        assert_eq!(control.record_cycle(), 1);
        assert_eq!(control.record_cycle(), 2);
        assert_eq!(control.cycles(), 2);
    }
}
