use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// The period a job's timer ticks at.
///
/// `fixed_tick` reproduces the single shared period of the first version of
/// this service; when absent the job's own cadence is used.
pub fn effective_cadence(cadence: Duration, fixed_tick: Option<Duration>) -> Duration {
    fixed_tick.unwrap_or(cadence)
}

/// Repeating timer whose first tick is one full `period` from now.
///
/// A run that overruns its period delays the following ticks instead of
/// firing a burst to catch up.
pub fn job_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}
