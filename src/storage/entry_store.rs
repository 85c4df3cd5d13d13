use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use anyhow::Result;

use super::{entities::TimeEntry, KeyValueStore};

/// The single key the whole entry list is persisted under.
pub const ENTRIES_KEY: &str = "timeEntries";

/// Filter used by [EntryStore::search_entries]. Unset fields let everything through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Inclusive lower bound.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Case-insensitive substring of the project name.
    #[serde(default)]
    pub project: Option<String>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        let date_match = self.start.is_none_or(|start| entry.date >= start)
            && self.end.is_none_or(|end| entry.date <= end);
        let project_match = self.project.as_deref().is_none_or(|project| {
            entry
                .project
                .to_lowercase()
                .contains(&project.to_lowercase())
        });
        date_match && project_match
    }
}

/// Flat list of [TimeEntry] values persisted through a [KeyValueStore]. Every mutation is an
/// atomic read-modify-write of the whole list.
pub struct EntryStore<S> {
    storage: S,
}

impl<S: KeyValueStore> EntryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Adds `minutes` to the entry for (`day`, `project`), creating it when missing.
    #[instrument(skip(self))]
    pub async fn add_entry(&self, day: NaiveDate, project: &str, minutes: f64) -> Result<()> {
        self.modify(|entries| {
            match entries.iter_mut().find(|entry| entry.is_for(day, project)) {
                Some(existing) => existing.time_spent += minutes,
                None => entries.push(TimeEntry::new(day, project, minutes)),
            }
        })
        .await?;
        debug!("Recorded {minutes:.3} minutes");
        Ok(())
    }

    /// Returns the full persisted list, empty if nothing has been recorded yet.
    pub async fn entries(&self) -> Result<Vec<TimeEntry>> {
        self.storage.get(ENTRIES_KEY, Vec::new()).await
    }

    pub async fn search_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        let mut entries = self.entries().await?;
        entries.retain(|entry| filter.matches(entry));
        Ok(entries)
    }

    /// Keeps only the entries `keep` accepts and persists the result. Returns how many were
    /// dropped.
    pub async fn retain(&self, keep: impl Fn(&TimeEntry) -> bool) -> Result<usize> {
        self.modify(|entries| {
            let before = entries.len();
            entries.retain(|entry| keep(entry));
            before - entries.len()
        })
        .await
    }

    /// Drops every entry recorded for `day`.
    pub async fn reset_day(&self, day: NaiveDate) -> Result<()> {
        let removed = self.retain(|entry| entry.date != day).await?;
        info!("Removed {removed} entries for {day}");
        Ok(())
    }

    pub async fn reset_all(&self) -> Result<()> {
        self.storage
            .update(ENTRIES_KEY, &Vec::<TimeEntry>::new())
            .await?;
        info!("Removed all entries");
        Ok(())
    }

    /// Every mutation goes through here, so the list is read and written under one lock.
    async fn modify<R>(&self, change: impl FnOnce(&mut Vec<TimeEntry>) -> R) -> Result<R> {
        self.storage.modify(ENTRIES_KEY, Vec::new(), change).await
    }
}
