//! Timed-trigger loop.
//!
//! Polls the offset-corrected clock against the target timestamp, sleeping a
//! short fixed interval per iteration. The sleep bounds CPU burn while
//! keeping trigger latency in the low single-digit milliseconds; converting
//! this to a blocking timer would lose that latency contract.

use std::time::Duration;

use tracing::info;

use super::clock::{Clock, ClockOffset};

/// Per-iteration sleep of the poll loop.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Minimum wall-clock spacing between countdown log lines.
const COUNTDOWN_INTERVAL_MS: i64 = 5_000;

/// Gate keeping the countdown log to at most one line per wall-clock window.
/// Keyed on the last emission timestamp, never an iteration count, so the
/// cadence is independent of poll frequency.
#[derive(Debug)]
pub struct CountdownGate {
    interval_ms: i64,
    last_emit_ms: Option<i64>,
}

impl CountdownGate {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms,
            last_emit_ms: None,
        }
    }

    /// Whether a countdown line is due at `now_ms`. The first call always
    /// emits; later calls emit once the interval has elapsed since the last
    /// emission.
    pub fn try_emit(&mut self, now_ms: i64) -> bool {
        match self.last_emit_ms {
            Some(last) if now_ms - last < self.interval_ms => false,
            _ => {
                self.last_emit_ms = Some(now_ms);
                true
            }
        }
    }
}

/// Outcome of a completed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triggered {
    /// Corrected exchange time at the poll that fired.
    pub fired_at_ms: i64,
}

/// Two-state wait: WAITING until the corrected clock reaches the target,
/// then TRIGGERED (terminal). No cancellation path and no timeout; a target
/// already in the past fires on the first poll.
pub struct TriggerLoop<C: Clock> {
    clock: C,
    offset: ClockOffset,
    target_ms: i64,
    countdown: CountdownGate,
}

impl<C: Clock> TriggerLoop<C> {
    pub fn new(clock: C, offset: ClockOffset, target_ms: i64) -> Self {
        Self {
            clock,
            offset,
            target_ms,
            countdown: CountdownGate::new(COUNTDOWN_INTERVAL_MS),
        }
    }

    /// Poll until the corrected clock satisfies `corrected >= target`. The
    /// earliest poll that satisfies the inequality fires; there is no
    /// interpolation or overshoot correction.
    pub async fn wait(&mut self) -> Triggered {
        loop {
            let local_ms = self.clock.now_ms();
            let corrected = self.offset.corrected(local_ms);
            if self.countdown.try_emit(local_ms) {
                let remaining_secs = (self.target_ms - corrected).max(0) / 1_000;
                info!("waiting to fire: {}s remaining", remaining_secs);
            }
            if corrected >= self.target_ms {
                return Triggered {
                    fired_at_ms: corrected,
                };
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
