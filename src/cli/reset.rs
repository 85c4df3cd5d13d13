use anyhow::Result;
use clap::{CommandFactory, Subcommand};
use tracing::info;

use crate::{
    storage::{entry_store::EntryStore, KeyValueStore},
    utils::clock::Clock,
};

use super::Args;

#[derive(Debug, Subcommand)]
pub enum ResetCommand {
    #[command(about = "Remove everything recorded today")]
    Today,
    #[command(about = "Remove every recorded entry")]
    All {
        #[arg(long, help = "Confirm removing all recorded time")]
        yes: bool,
    },
}

/// Command to process `reset`. A tracker that is running at the same time keeps its unsaved
/// minutes and saves them into today on its next flush.
pub async fn process_reset_command(
    store: &EntryStore<impl KeyValueStore>,
    command: ResetCommand,
    clock: &dyn Clock,
) -> Result<()> {
    match command {
        ResetCommand::Today => {
            let today = clock.today();
            store.reset_day(today).await?;
            println!("Removed time recorded on {today}");
        }
        ResetCommand::All { yes: false } => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::MissingRequiredArgument,
                    "Removing all recorded time can't be undone. Pass --yes to confirm",
                )
                .into());
        }
        ResetCommand::All { yes: true } => {
            info!("Removing all entries on request");
            store.reset_all().await?;
            println!("Removed all recorded time");
        }
    }
    Ok(())
}
