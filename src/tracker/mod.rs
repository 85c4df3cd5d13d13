use std::{io, path::PathBuf, pin::pin};

use anyhow::Result;
use futures::{Stream, StreamExt};
use host::HostAdapter;
use session::SessionTracker;
use tokio::io::{AsyncBufReadExt, AsyncWrite, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use workspace::{FolderWorkspace, Workspace};

use crate::{
    storage::{entry_store::EntryStore, file_store::JsonFileStore, KeyValueStore},
    utils::clock::DefaultClock,
};

pub mod args;
pub mod host;
pub mod session;
pub mod shutdown;
pub mod triggers;
pub mod workspace;

use args::TrackerArgs;

/// Represents the starting point for tracking. Host events are read from stdin and replies are
/// written to stdout until the host closes stdin or the process is told to stop.
pub async fn start_tracker(dir: PathBuf, args: TrackerArgs) -> Result<()> {
    let store = EntryStore::new(JsonFileStore::new(dir.join("store"))?);
    let mut tracker = SessionTracker::new(
        store,
        FolderWorkspace::new(args.workspace.clone()),
        Box::new(DefaultClock),
        args.trigger_config()?,
    );
    let mut adapter = HostAdapter::new(tokio::io::stdout(), args.focused);
    let events = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    let shutdown_token = CancellationToken::new();

    let (_, result) = tokio::join!(shutdown::detect_shutdown(shutdown_token.clone()), async {
        let result =
            run_host_loop(&mut tracker, &mut adapter, events, shutdown_token.clone()).await;
        shutdown_token.cancel();
        result
    });

    result.inspect_err(|e| error!("Tracker stopped with an error {e:?}"))
}

/// Executes the tracker event loop. Whatever way the loop ends, tracking is stopped so the last
/// interval is saved.
pub async fn run_host_loop<S, W, Out>(
    tracker: &mut SessionTracker<S, W>,
    adapter: &mut HostAdapter<Out>,
    events: impl Stream<Item = io::Result<String>>,
    shutdown: CancellationToken,
) -> Result<()>
where
    S: KeyValueStore,
    W: Workspace,
    Out: AsyncWrite + Unpin,
{
    let mut events = pin!(events);
    adapter.attach(tracker);

    let result = loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutting down tracker");
                break Ok(());
            }
            line = events.next() => match line {
                Some(Ok(line)) => {
                    if let Err(e) = adapter.handle_line(&line, tracker).await {
                        break Err(e);
                    }
                }
                Some(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                    if let Err(e) = adapter.reject_line(&e).await {
                        break Err(e);
                    }
                }
                Some(Err(e)) => {
                    error!("Failed to read host events {e:?}");
                    break Err(e.into());
                }
                None => {
                    info!("Host closed the event stream");
                    break Ok(());
                }
            },
            trigger = tracker.next_trigger() => {
                if let Err(e) = adapter.on_trigger(trigger, tracker).await {
                    break Err(e);
                }
            }
        }
    };

    tracker
        .stop_tracking()
        .await
        .inspect_err(|e| error!("Failed to save the last session {e:?}"))?;
    result
}
