use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::Result;
use crate::channel::Signal;

/// Detects suspend/resume by sampling the wall clock.
///
/// Tokio timers run on the monotonic clock, which stands still while the
/// machine sleeps, so a gap only shows up against wall-clock time.
pub struct SleepDetector {
    check_interval: Duration,
    gap: Duration,
    last: DateTime<Utc>,
    wake: Signal,
    cancel: CancellationToken,
}

impl SleepDetector {
    #[must_use]
    pub fn new(check_interval: Duration, gap: Duration, wake: Signal, cancel: CancellationToken) -> Self {
        Self {
            check_interval,
            gap,
            last: Utc::now(),
            wake,
            cancel,
        }
    }

    /// Record a sample taken at `now`; true when the time since the previous
    /// sample exceeds the gap. A clock that went backwards counts as no gap.
    pub fn check(&mut self, now: DateTime<Utc>) -> bool {
        let elapsed = (now - self.last).to_std().unwrap_or_default();
        self.last = now;
        elapsed > self.gap
    }

    pub async fn run(mut self) -> Result<()> {
        let mut ticker = interval_at(Instant::now() + self.check_interval, self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => {
                    if self.check(Utc::now()) {
                        info!("Wall clock jumped, assuming resume from sleep");
                        self.wake.notify();
                    }
                }
            }
        }
    }
}
