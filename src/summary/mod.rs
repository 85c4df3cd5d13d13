//! Pure aggregation over entry lists. Nothing here knows about sessions or storage, the
//! tracker adds its live time on top of these results.

pub mod analysis;
pub mod period;

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::storage::entities::TimeEntry;

/// Totals per day, per project and overall, in minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryData {
    pub per_day_totals: BTreeMap<NaiveDate, f64>,
    pub per_project_totals: BTreeMap<Arc<str>, f64>,
    pub grand_total: f64,
}

/// Single pass over `entries`. The store guarantees one entry per (date, project), so nothing
/// is counted twice.
pub fn summarize<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> SummaryData {
    let mut summary = SummaryData::default();
    for entry in entries {
        *summary.per_day_totals.entry(entry.date).or_default() += entry.time_spent;
        *summary
            .per_project_totals
            .entry(entry.project.clone())
            .or_default() += entry.time_spent;
        summary.grand_total += entry.time_spent;
    }
    summary
}

/// Minutes recorded from `start` up to `today`, both inclusive.
pub fn total_since<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
    start: NaiveDate,
    today: NaiveDate,
) -> f64 {
    entries
        .into_iter()
        .filter(|entry| entry.date >= start && entry.date <= today)
        .map(|entry| entry.time_spent)
        .sum()
}

/// Minutes recorded on `day`, optionally only for the project named exactly `project`.
pub fn total_on<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
    day: NaiveDate,
    project: Option<&str>,
) -> f64 {
    entries
        .into_iter()
        .filter(|entry| entry.date == day)
        .filter(|entry| project.is_none_or(|project| &*entry.project == project))
        .map(|entry| entry.time_spent)
        .sum()
}

pub fn total<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> f64 {
    entries.into_iter().map(|entry| entry.time_spent).sum()
}
