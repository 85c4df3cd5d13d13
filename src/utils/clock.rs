use chrono::{DateTime, Local, NaiveDate};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. Everything that
/// computes elapsed time or "today" goes through it, so tests can substitute their own.
pub trait Clock: Send + Sync + 'static {
    fn time(&self) -> DateTime<Local>;

    /// Monotonic instant used for arming periodic triggers.
    fn instant(&self) -> Instant;

    /// Local calendar day entries are recorded against.
    fn today(&self) -> NaiveDate {
        self.time().date_naive()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// Clock anchored at a fixed local time that moves with tokio's clock. With paused tokio time
/// this makes elapsed time fully deterministic.
#[cfg(test)]
#[derive(Clone)]
pub struct TestClock {
    pub start_time: DateTime<Local>,
    pub reference: Instant,
}

#[cfg(test)]
impl TestClock {
    pub fn starting_at(start_time: DateTime<Local>) -> Self {
        Self {
            start_time,
            reference: Instant::now(),
        }
    }
}

#[cfg(test)]
impl Clock for TestClock {
    fn time(&self) -> DateTime<Local> {
        self.start_time + self.reference.elapsed()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}
