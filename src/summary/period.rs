use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone};
use now::DateTimeNow;
use serde::{Deserialize, Serialize};

use crate::{
    storage::entities::TimeEntry,
    utils::time::sunday_week_start,
};

use super::{total, total_since};

/// Rolling ranges ending today. Weeks start on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
    AllTime,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Today => write!(f, "Today"),
            Period::Week => write!(f, "This week"),
            Period::Month => write!(f, "This month"),
            Period::Year => write!(f, "This year"),
            Period::AllTime => write!(f, "All time"),
        }
    }
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Today,
        Period::Week,
        Period::Month,
        Period::Year,
        Period::AllTime,
    ];

    /// First day of the period containing `now`. All-time has no lower bound.
    pub fn start<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<NaiveDate> {
        match self {
            Period::Today => Some(now.date_naive()),
            Period::Week => Some(sunday_week_start(now.date_naive())),
            Period::Month => Some(now.beginning_of_month().date_naive()),
            Period::Year => Some(now.beginning_of_year().date_naive()),
            Period::AllTime => None,
        }
    }

    /// Minutes recorded in this period, with `now`'s day as the inclusive upper bound.
    pub fn total<Tz: TimeZone>(self, entries: &[TimeEntry], now: &DateTime<Tz>) -> f64 {
        match self.start(now) {
            Some(start) => total_since(entries, start, now.date_naive()),
            None => total(entries),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub today: f64,
    pub week: f64,
    pub month: f64,
    pub year: f64,
    pub all_time: f64,
}

impl PeriodTotals {
    pub fn compute<Tz: TimeZone>(entries: &[TimeEntry], now: &DateTime<Tz>) -> Self {
        Self {
            today: Period::Today.total(entries, now),
            week: Period::Week.total(entries, now),
            month: Period::Month.total(entries, now),
            year: Period::Year.total(entries, now),
            all_time: Period::AllTime.total(entries, now),
        }
    }

    /// Every range ends today, so unflushed minutes belong to all of them.
    pub fn with_live(self, live: f64) -> Self {
        Self {
            today: self.today + live,
            week: self.week + live,
            month: self.month + live,
            year: self.year + live,
            all_time: self.all_time + live,
        }
    }

    pub fn get(&self, period: Period) -> f64 {
        match period {
            Period::Today => self.today,
            Period::Week => self.week,
            Period::Month => self.month,
            Period::Year => self.year,
            Period::AllTime => self.all_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::{
        storage::entities::TimeEntry,
        summary::period::{Period, PeriodTotals},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_starts() {
        // Wednesday
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 15, 30, 0).unwrap();
        assert_eq!(Period::Today.start(&now), Some(date(2024, 1, 3)));
        assert_eq!(Period::Week.start(&now), Some(date(2023, 12, 31)));
        assert_eq!(Period::Month.start(&now), Some(date(2024, 1, 1)));
        assert_eq!(Period::Year.start(&now), Some(date(2024, 1, 1)));
        assert_eq!(Period::AllTime.start(&now), None);

        let later = Utc.with_ymd_and_hms(2024, 8, 17, 9, 0, 0).unwrap();
        assert_eq!(Period::Week.start(&later), Some(date(2024, 8, 11)));
        assert_eq!(Period::Month.start(&later), Some(date(2024, 8, 1)));
        assert_eq!(Period::Year.start(&later), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_period_totals_across_year_change() {
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 15, 30, 0).unwrap();
        let entries = vec![
            TimeEntry::new(date(2023, 11, 20), "a", 1.),
            TimeEntry::new(date(2023, 12, 30), "a", 2.),
            TimeEntry::new(date(2023, 12, 31), "a", 4.),
            TimeEntry::new(date(2024, 1, 2), "b", 8.),
            TimeEntry::new(date(2024, 1, 3), "a", 16.),
            TimeEntry::new(date(2024, 1, 3), "b", 32.),
            // future entries are outside every bounded range
            TimeEntry::new(date(2024, 1, 4), "a", 64.),
        ];
        let totals = PeriodTotals::compute(&entries, &now);
        assert_eq!(
            totals,
            PeriodTotals {
                today: 48.,
                week: 60.,
                month: 56.,
                year: 56.,
                all_time: 127.,
            }
        );
        assert_eq!(totals.get(Period::Week), 60.);

        let live = totals.with_live(1.5);
        for period in Period::ALL {
            assert_eq!(live.get(period), totals.get(period) + 1.5);
        }
    }
}
