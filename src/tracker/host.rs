//! Line-delimited JSON protocol spoken with the editor. Events come in tagged by `event`,
//! replies go out tagged by `type`. The adapter turns events into explicit calls on
//! [SessionTracker] so the tracker itself never sees host types.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use crate::{
    storage::{entities::TimeEntry, entry_store::EntryFilter, KeyValueStore},
    summary::SummaryData,
    utils::time::format_clock,
};

use super::{
    session::{LiveTotals, SessionTracker},
    triggers::Trigger,
    workspace::Workspace,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    WindowState { focused: bool },
    DocumentOpened,
    WorkspaceFolders { folders: Vec<PathBuf> },
    ShowSummary,
    Refresh,
    Search(EntryFilter),
    ResetToday,
    /// The editor is expected to confirm with the user before sending this.
    ResetAll,
}

/// Status bar payload: the live totals plus their rendered text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tooltip: String,
    #[serde(flatten)]
    pub totals: LiveTotals,
}

impl From<LiveTotals> for StatusLine {
    fn from(totals: LiveTotals) -> Self {
        let periods = &totals.periods;
        Self {
            text: format!("💻 {}", format_clock(periods.today)),
            tooltip: format!(
                "Total Coding Time:\nThis week: {}\nThis month: {}\nAll Time: {}\nClick to show summary",
                format_clock(periods.week),
                format_clock(periods.month),
                format_clock(periods.all_time),
            ),
            totals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Status(StatusLine),
    Summary(SummaryData),
    Entries { entries: Vec<TimeEntry> },
    Error { message: String },
}

/// Forwards host events to a tracker and writes replies to `output`.
pub struct HostAdapter<Out> {
    output: Out,
    focused: bool,
}

impl<Out: AsyncWrite + Unpin> HostAdapter<Out> {
    /// `focused` is the window state when the editor launched the tracker.
    pub fn new(output: Out, focused: bool) -> Self {
        Self { output, focused }
    }

    pub fn into_output(self) -> Out {
        self.output
    }

    /// Starts tracking right away if the editor already had focus.
    pub fn attach<S: KeyValueStore, W: Workspace>(&self, tracker: &mut SessionTracker<S, W>) {
        if self.focused {
            tracker.start_tracking();
        }
    }

    /// Decodes and handles one input line. Problems with the line or with the store are
    /// answered with an error reply; only a failing output is returned as an error.
    pub async fn handle_line<S: KeyValueStore, W: Workspace>(
        &mut self,
        line: &str,
        tracker: &mut SessionTracker<S, W>,
    ) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let event = match serde_json::from_str::<HostEvent>(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Ignoring undecodable host event {line}: {e}");
                return self.send_error(format!("Invalid event: {e}")).await;
            }
        };
        debug!("Received {event:?}");
        if let Err(e) = self.handle(event, tracker).await {
            error!("Failed to handle host event {e:?}");
            self.send_error(format!("{e:#}")).await?;
        }
        Ok(())
    }

    /// Answers a line that couldn't be read as text, e.g. one that isn't valid UTF-8.
    pub async fn reject_line(&mut self, e: &std::io::Error) -> Result<()> {
        warn!("Ignoring unreadable host event {e}");
        self.send_error(format!("Invalid event: {e}")).await
    }

    pub async fn handle<S: KeyValueStore, W: Workspace>(
        &mut self,
        event: HostEvent,
        tracker: &mut SessionTracker<S, W>,
    ) -> Result<()> {
        match event {
            HostEvent::WindowState { focused } => {
                self.focused = focused;
                if focused {
                    tracker.start_tracking();
                } else {
                    tracker.stop_tracking().await?;
                }
            }
            HostEvent::DocumentOpened => {
                if self.focused {
                    tracker.start_tracking();
                }
            }
            HostEvent::WorkspaceFolders { folders } => {
                tracker.workspace_mut().set_folders(folders);
            }
            HostEvent::ShowSummary => {
                let summary = tracker.summary_data().await?;
                self.send(&HostMessage::Summary(summary)).await?;
            }
            HostEvent::Refresh => self.send_status(tracker).await?,
            HostEvent::Search(filter) => {
                let entries = tracker.search_entries(&filter).await?;
                self.send(&HostMessage::Entries { entries }).await?;
            }
            HostEvent::ResetToday => {
                tracker.reset_timer().await?;
                self.send_status(tracker).await?;
            }
            HostEvent::ResetAll => {
                tracker.reset_all_timers().await?;
                self.send_status(tracker).await?;
            }
        }
        Ok(())
    }

    /// UI ticks refresh the status line, flush ticks persist the session. Store failures are
    /// reported to the host and the next tick tries again. A failed flush keeps its window.
    /// Only a failing output is returned as an error.
    pub async fn on_trigger<S: KeyValueStore, W: Workspace>(
        &mut self,
        trigger: Trigger,
        tracker: &mut SessionTracker<S, W>,
    ) -> Result<()> {
        match trigger {
            Trigger::Ui => match tracker.live_totals().await {
                Ok(totals) => self.send(&HostMessage::Status(totals.into())).await,
                Err(e) => {
                    error!("Failed to read totals {e:?}");
                    self.send_error(format!("{e:#}")).await
                }
            },
            Trigger::Flush => match tracker.save_current_session().await {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!("Failed to flush session {e:?}");
                    self.send_error(format!("{e:#}")).await
                }
            },
        }
    }

    async fn send_status<S: KeyValueStore, W: Workspace>(
        &mut self,
        tracker: &SessionTracker<S, W>,
    ) -> Result<()> {
        let totals = tracker.live_totals().await?;
        self.send(&HostMessage::Status(totals.into())).await
    }

    async fn send_error(&mut self, message: String) -> Result<()> {
        self.send(&HostMessage::Error { message }).await
    }

    async fn send(&mut self, message: &HostMessage) -> Result<()> {
        let mut buffer = serde_json::to_vec(message)?;
        buffer.push(b'\n');
        self.output.write_all(&buffer).await?;
        self.output.flush().await?;
        Ok(())
    }
}
