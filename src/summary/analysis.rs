use std::sync::Arc;

use chrono::NaiveDate;

use crate::utils::percentage::{minutes_percentage, Percentage};

use super::SummaryData;

#[derive(Debug, PartialEq)]
pub struct ProjectShare {
    pub project: Arc<str>,
    pub minutes: f64,
    pub percentage: Percentage,
}

/// Returns projects ordered by time spent, longest first, dropping those whose share of the
/// grand total is below `min_percentage`.
pub fn project_shares(summary: &SummaryData, min_percentage: Percentage) -> Vec<ProjectShare> {
    let mut shares = summary
        .per_project_totals
        .iter()
        .map(|(project, minutes)| ProjectShare {
            project: project.clone(),
            minutes: *minutes,
            percentage: minutes_percentage(*minutes, summary.grand_total),
        })
        .filter(|share| share.percentage >= min_percentage)
        .collect::<Vec<_>>();
    shares.sort_by(|a, b| b.minutes.total_cmp(&a.minutes));
    shares
}

/// The `count` latest days with recorded time, newest first.
pub fn recent_days(summary: &SummaryData, count: usize) -> Vec<(NaiveDate, f64)> {
    summary
        .per_day_totals
        .iter()
        .rev()
        .take(count)
        .map(|(day, minutes)| (*day, *minutes))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        storage::entities::TimeEntry,
        summary::{
            analysis::{project_shares, recent_days},
            summarize,
        },
        utils::percentage::Percentage,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_project_shares_sorted_and_filtered() {
        let entries = vec![
            TimeEntry::new(day(1), "small", 1.),
            TimeEntry::new(day(1), "big", 74.),
            TimeEntry::new(day(2), "medium", 25.),
        ];
        let summary = summarize(&entries);

        let all = project_shares(&summary, Percentage::ZERO);
        let names = all.iter().map(|s| &*s.project).collect::<Vec<_>>();
        assert_eq!(names, vec!["big", "medium", "small"]);
        assert!((*all[0].percentage - 74.).abs() < 1e-9);

        let filtered = project_shares(&summary, Percentage::new_opt(5.).unwrap());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_recent_days_newest_first() {
        let entries = (1..=10)
            .map(|d| TimeEntry::new(day(d), "a", d as f64))
            .collect::<Vec<_>>();
        let summary = summarize(&entries);
        let days = recent_days(&summary, 3);
        assert_eq!(days, vec![(day(10), 10.), (day(9), 9.), (day(8), 8.)]);
        assert_eq!(recent_days(&summary, 20).len(), 10);
    }
}
