use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One accounting record: minutes spent on a project during a calendar day. The store keeps at
/// most one of these per (date, project).
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    /// Serialized as a zero-padded `YYYY-MM-DD` string.
    pub date: NaiveDate,
    pub project: Arc<str>,
    /// Fractional minutes.
    pub time_spent: f64,
}

impl TimeEntry {
    pub fn new(date: NaiveDate, project: impl Into<Arc<str>>, time_spent: f64) -> Self {
        Self {
            date,
            project: project.into(),
            time_spent,
        }
    }

    pub fn is_for(&self, date: NaiveDate, project: &str) -> bool {
        self.date == date && &*self.project == project
    }
}
