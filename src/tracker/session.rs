use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    storage::{
        entities::TimeEntry,
        entry_store::{EntryFilter, EntryStore},
        KeyValueStore,
    },
    summary::{
        period::{Period, PeriodTotals},
        summarize, total_on, SummaryData,
    },
    utils::{clock::Clock, time::minutes_between},
};

use super::{
    triggers::{Trigger, TriggerConfig, Triggers},
    workspace::{project_name, Workspace},
};

/// Interval being tracked but not yet flushed into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub start: DateTime<Local>,
    pub project: Arc<str>,
}

/// Snapshot of every total the status line shows, live time included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTotals {
    pub tracking: bool,
    pub project: Arc<str>,
    pub current_project: f64,
    #[serde(flatten)]
    pub periods: PeriodTotals,
}

/// Owns the Inactive/Active state machine. While a [Session] exists the tracker is active and
/// its [Triggers] are armed; both are created and dropped together.
pub struct SessionTracker<S, W> {
    store: EntryStore<S>,
    workspace: W,
    clock: Box<dyn Clock>,
    trigger_config: TriggerConfig,
    session: Option<Session>,
    triggers: Option<Triggers>,
}

impl<S: KeyValueStore, W: Workspace> SessionTracker<S, W> {
    pub fn new(
        store: EntryStore<S>,
        workspace: W,
        clock: Box<dyn Clock>,
        trigger_config: TriggerConfig,
    ) -> Self {
        Self {
            store,
            workspace,
            clock,
            trigger_config,
            session: None,
            triggers: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &EntryStore<S> {
        &self.store
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        &mut self.workspace
    }

    /// Starts a session for the current project and arms both triggers. Does nothing while a
    /// session is already running. Returns whether tracking started.
    pub fn start_tracking(&mut self) -> bool {
        if self.session.is_some() {
            return false;
        }
        let project = project_name(&self.workspace.folders());
        info!("Started tracking {project}");
        self.session = Some(Session {
            start: self.clock.time(),
            project,
        });
        self.triggers = Some(Triggers::arm(&self.trigger_config, self.clock.instant()));
        true
    }

    /// Disarms the triggers, flushes what is left of the session and clears it. Does nothing
    /// while inactive. The session is cleared even if the final flush fails.
    pub async fn stop_tracking(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        self.triggers = None;
        let result = self.save_current_session().await;
        if let Some(session) = self.session.take() {
            info!("Stopped tracking {}", session.project);
        }
        result
    }

    /// Flushes elapsed session time into today's entry and restarts the session window at
    /// now, so consecutive flushes never overlap. If the store rejects the write the window is
    /// kept and retried by the next flush.
    #[instrument(skip(self))]
    pub async fn save_current_session(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let now = self.clock.time();
        let elapsed = minutes_between(&session.start, &now);
        self.store
            .add_entry(now.date_naive(), &session.project, elapsed)
            .await?;
        session.start = now;
        debug!("Flushed {elapsed:.3} minutes for {}", session.project);
        Ok(())
    }

    /// Resolves once the next trigger is due. Never resolves while inactive, which lets it sit
    /// in a `select!` next to host events.
    pub async fn next_trigger(&mut self) -> Trigger {
        match self.triggers.as_mut() {
            Some(triggers) => triggers.next().await,
            None => std::future::pending().await,
        }
    }

    /// Unflushed minutes of the running session, zero while inactive.
    fn live_minutes(&self, now: &DateTime<Local>) -> f64 {
        self.session
            .as_ref()
            .map_or(0., |session| minutes_between(&session.start, now))
    }

    async fn period_total(&self, period: Period) -> Result<f64> {
        let entries = self.store.entries().await?;
        let now = self.clock.time();
        Ok(period.total(&entries, &now) + self.live_minutes(&now))
    }

    pub async fn today_total(&self) -> Result<f64> {
        self.period_total(Period::Today).await
    }

    pub async fn weekly_total(&self) -> Result<f64> {
        self.period_total(Period::Week).await
    }

    pub async fn monthly_total(&self) -> Result<f64> {
        self.period_total(Period::Month).await
    }

    pub async fn yearly_total(&self) -> Result<f64> {
        self.period_total(Period::Year).await
    }

    pub async fn all_time_total(&self) -> Result<f64> {
        self.period_total(Period::AllTime).await
    }

    /// Today's minutes for `project`. Live time only counts when the running session belongs
    /// to the same project.
    pub async fn project_time(&self, project: &str) -> Result<f64> {
        let entries = self.store.entries().await?;
        let now = self.clock.time();
        Ok(self.project_time_in(&entries, project, &now))
    }

    /// Like [Self::project_time] for the project the workspace points at right now, which may
    /// differ from the one the running session started with.
    pub async fn current_project_time(&self) -> Result<f64> {
        let project = project_name(&self.workspace.folders());
        self.project_time(&project).await
    }

    fn project_time_in(&self, entries: &[TimeEntry], project: &str, now: &DateTime<Local>) -> f64 {
        let persisted = total_on(entries, now.date_naive(), Some(project));
        match &self.session {
            Some(session) if &*session.project == project => persisted + self.live_minutes(now),
            Some(_) | None => persisted,
        }
    }

    /// Every total at once, computed from a single read of the store.
    pub async fn live_totals(&self) -> Result<LiveTotals> {
        let entries = self.store.entries().await?;
        let now = self.clock.time();
        let project = project_name(&self.workspace.folders());
        Ok(LiveTotals {
            tracking: self.is_tracking(),
            current_project: self.project_time_in(&entries, &project, &now),
            project,
            periods: PeriodTotals::compute(&entries, &now).with_live(self.live_minutes(&now)),
        })
    }

    /// Summary of persisted entries only.
    pub async fn summary_data(&self) -> Result<SummaryData> {
        let entries = self.store.entries().await?;
        Ok(summarize(&entries))
    }

    pub async fn search_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        self.store.search_entries(filter).await
    }

    /// Stops tracking and drops everything recorded today.
    pub async fn reset_timer(&mut self) -> Result<()> {
        self.stop_tracking().await?;
        self.store.reset_day(self.clock.today()).await
    }

    /// Stops tracking and drops every entry.
    pub async fn reset_all_timers(&mut self) -> Result<()> {
        self.stop_tracking().await?;
        self.store.reset_all().await
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc, time::Duration};

    use anyhow::Result;
    use chrono::{Local, NaiveDate, TimeZone};

    use crate::{
        storage::{
            entities::TimeEntry,
            entry_store::EntryStore,
            memory::{FailingStore, MemoryStore},
        },
        tracker::{
            session::SessionTracker,
            triggers::{Trigger, TriggerConfig},
            workspace::{FolderWorkspace, MockWorkspace, Workspace, UNKNOWN_PROJECT},
        },
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Wednesday 2024-01-03, noon local time.
    fn test_clock() -> TestClock {
        TestClock::starting_at(Local.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap())
    }

    fn tracker_in<W: Workspace>(workspace: W) -> SessionTracker<MemoryStore, W> {
        SessionTracker::new(
            EntryStore::new(MemoryStore::new()),
            workspace,
            Box::new(test_clock()),
            TriggerConfig::default(),
        )
    }

    fn tracker_for(project_dir: &str) -> SessionTracker<MemoryStore, FolderWorkspace> {
        tracker_in(FolderWorkspace::new(vec![PathBuf::from(project_dir)]))
    }

    fn today() -> NaiveDate {
        date(2024, 1, 3)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_resolves_project_once() -> Result<()> {
        *TEST_LOGGING;
        let mut workspace = MockWorkspace::new();
        workspace
            .expect_folders()
            .times(1)
            .returning(|| vec![PathBuf::from("/code/proj-a")]);
        let mut tracker = tracker_in(workspace);

        assert!(tracker.start_tracking());
        let first = tracker.session().cloned();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!tracker.start_tracking());
        assert_eq!(tracker.session().cloned(), first);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_flushes_elapsed_time_once() -> Result<()> {
        let mut tracker = tracker_for("/code/proj-a");
        tracker.start_tracking();
        tracker.start_tracking();
        tokio::time::advance(Duration::from_secs(90)).await;
        tracker.stop_tracking().await?;
        assert!(!tracker.is_tracking());

        assert_eq!(
            tracker.store().entries().await?,
            vec![TimeEntry::new(today(), "proj-a", 1.5)]
        );

        // already inactive
        tracker.stop_tracking().await?;
        assert_eq!(tracker.store().entries().await?.len(), 1);
        assert_eq!(tracker.store().entries().await?[0].time_spent, 1.5);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_save_is_noop() -> Result<()> {
        let mut tracker = tracker_for("/code/proj-a");
        tracker.save_current_session().await?;
        tracker.stop_tracking().await?;
        assert!(tracker.store().entries().await?.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_project_without_folders() -> Result<()> {
        let mut tracker = tracker_in(FolderWorkspace::default());
        tracker.start_tracking();
        tokio::time::advance(Duration::from_secs(30)).await;
        tracker.stop_tracking().await?;
        assert_eq!(
            tracker.store().entries().await?,
            vec![TimeEntry::new(today(), UNKNOWN_PROJECT, 0.5)]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_trigger_persists_and_restarts_window() -> Result<()> {
        let mut tracker = tracker_for("/code/proj-a");
        tracker.start_tracking();

        let mut ui_ticks = 0;
        loop {
            match tracker.next_trigger().await {
                Trigger::Ui => ui_ticks += 1,
                Trigger::Flush => {
                    tracker.save_current_session().await?;
                    break;
                }
            }
        }
        assert_eq!(ui_ticks, 59);
        assert_eq!(
            tracker.store().entries().await?,
            vec![TimeEntry::new(today(), "proj-a", 1.)]
        );
        // nothing unflushed right after a flush
        assert_eq!(tracker.today_total().await?, 1.);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(tracker.today_total().await?, 1.5);
        tracker.stop_tracking().await?;
        assert_eq!(
            tracker.store().entries().await?,
            vec![TimeEntry::new(today(), "proj-a", 1.5)]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_trigger_pending_while_inactive() {
        let mut tracker = tracker_for("/code/proj-a");
        let result =
            tokio::time::timeout(Duration::from_secs(600), tracker.next_trigger()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_totals_include_live_time() -> Result<()> {
        let mut tracker = tracker_for("/code/proj-a");
        let store = tracker.store();
        store.add_entry(date(2023, 12, 30), "proj-a", 100.).await?;
        store.add_entry(date(2023, 12, 31), "proj-a", 10.).await?;
        store.add_entry(date(2024, 1, 2), "proj-b", 20.).await?;
        store.add_entry(today(), "proj-a", 5.).await?;

        assert_eq!(tracker.today_total().await?, 5.);
        assert_eq!(tracker.weekly_total().await?, 35.);

        tracker.start_tracking();
        tokio::time::advance(Duration::from_secs(120)).await;

        assert_eq!(tracker.today_total().await?, 7.);
        assert_eq!(tracker.weekly_total().await?, 37.);
        assert_eq!(tracker.monthly_total().await?, 27.);
        assert_eq!(tracker.yearly_total().await?, 27.);
        assert_eq!(tracker.all_time_total().await?, 137.);
        assert_eq!(tracker.current_project_time().await?, 7.);
        assert_eq!(tracker.project_time("proj-b").await?, 0.);

        let live = tracker.live_totals().await?;
        assert!(live.tracking);
        assert_eq!(&*live.project, "proj-a");
        assert_eq!(live.current_project, 7.);
        assert_eq!(live.periods.week, 37.);
        assert_eq!(live.periods.all_time, 137.);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_project_time_after_workspace_switch() -> Result<()> {
        let mut tracker = tracker_for("/code/proj-a");
        tracker.store().add_entry(today(), "proj-b", 3.).await?;
        tracker.start_tracking();
        tokio::time::advance(Duration::from_secs(60)).await;

        tracker
            .workspace_mut()
            .set_folders(vec![PathBuf::from("/code/proj-b")]);
        // session still belongs to proj-a
        assert_eq!(tracker.current_project_time().await?, 3.);
        assert_eq!(tracker.project_time("proj-a").await?, 1.);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_timer_drops_only_today() -> Result<()> {
        let mut tracker = tracker_for("/code/proj-a");
        tracker.store().add_entry(date(2024, 1, 2), "proj-a", 20.).await?;
        tracker.store().add_entry(today(), "proj-a", 5.).await?;
        tracker.start_tracking();
        tokio::time::advance(Duration::from_secs(60)).await;

        tracker.reset_timer().await?;
        assert!(!tracker.is_tracking());
        assert_eq!(
            tracker.store().entries().await?,
            vec![TimeEntry::new(date(2024, 1, 2), "proj-a", 20.)]
        );
        assert_eq!(tracker.today_total().await?, 0.);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_all_timers() -> Result<()> {
        let mut tracker = tracker_for("/code/proj-a");
        tracker.store().add_entry(date(2024, 1, 2), "proj-a", 20.).await?;
        tracker.start_tracking();
        tokio::time::advance(Duration::from_secs(60)).await;

        tracker.reset_all_timers().await?;
        assert!(!tracker.is_tracking());
        assert!(tracker.store().entries().await?.is_empty());
        assert_eq!(tracker.all_time_total().await?, 0.);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_keeps_window_for_retry() -> Result<()> {
        let store = Arc::new(FailingStore::default());
        let mut tracker = SessionTracker::new(
            EntryStore::new(store.clone()),
            FolderWorkspace::new(vec![PathBuf::from("/code/proj-a")]),
            Box::new(test_clock()),
            TriggerConfig::default(),
        );
        tracker.start_tracking();
        let started = tracker.session().map(|session| session.start);
        tokio::time::advance(Duration::from_secs(30)).await;

        store.set_fail_writes(true);
        assert!(tracker.save_current_session().await.is_err());
        assert_eq!(tracker.session().map(|session| session.start), started);
        assert_eq!(tracker.today_total().await?, 0.5);

        store.set_fail_writes(false);
        tokio::time::advance(Duration::from_secs(30)).await;
        tracker.save_current_session().await?;
        assert_eq!(
            tracker.store().entries().await?,
            vec![TimeEntry::new(today(), "proj-a", 1.)]
        );

        tokio::time::advance(Duration::from_secs(15)).await;
        store.set_fail_writes(true);
        assert!(tracker.stop_tracking().await.is_err());
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.store().entries().await?[0].time_spent, 1.);
        Ok(())
    }
}
