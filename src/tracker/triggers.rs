use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
pub const DEFAULT_FLUSH_TICKS: u32 = 60;

/// Cadence of the two periodic triggers. The flush period is always a whole number of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
    tick: Duration,
    flush_ticks: u32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            flush_ticks: DEFAULT_FLUSH_TICKS,
        }
    }
}

impl TriggerConfig {
    /// Both periods have to be non-zero for the intervals to make sense.
    pub fn new_opt(tick: Duration, flush_ticks: u32) -> Option<Self> {
        if tick.is_zero() || flush_ticks == 0 {
            None
        } else {
            Some(Self { tick, flush_ticks })
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn flush_period(&self) -> Duration {
        self.tick * self.flush_ticks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Refresh whatever displays live totals. No storage work.
    Ui,
    /// Persist elapsed session time.
    Flush,
}

/// Armed pair of periodic triggers. Dropping the value disarms both.
#[derive(Debug)]
pub struct Triggers {
    ui: Interval,
    flush: Interval,
}

impl Triggers {
    /// First ticks fire one period after `now`, not immediately.
    pub fn arm(config: &TriggerConfig, now: Instant) -> Self {
        let mut ui = interval_at(now + config.tick(), config.tick());
        ui.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut flush = interval_at(now + config.flush_period(), config.flush_period());
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { ui, flush }
    }

    /// Waits for the next due trigger. Flush wins when both are due.
    pub async fn next(&mut self) -> Trigger {
        tokio::select! {
            biased;
            _ = self.flush.tick() => Trigger::Flush,
            _ = self.ui.tick() => Trigger::Ui,
        }
    }
}
