pub mod reset;
pub mod search;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use reset::{process_reset_command, ResetCommand};
use search::{process_search_command, SearchCommand};
use summary::{process_summary_command, process_totals_command, SummaryCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    storage::{entry_store::EntryStore, file_store::JsonFileStore},
    tracker::{args::TrackerArgs, start_tracker},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX, TRACKER_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "codetime", version, long_about = None)]
#[command(about = "Tracks time spent coding per project and day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/codetime or $HOME/.local/state/codetime"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Track coding time. Reads editor events from stdin and writes status updates to stdout"
    )]
    Track {
        #[command(flatten)]
        args: TrackerArgs,
    },
    #[command(about = "Show total, per project and per day coding time")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "List recorded entries filtered by days and project")]
    Search {
        #[command(flatten)]
        command: SearchCommand,
    },
    #[command(about = "Show coding time for today, this week, month, year and all time")]
    Totals {
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },
    #[command(about = "Remove recorded time")]
    Reset {
        #[command(subcommand)]
        command: ResetCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Track { .. } => TRACKER_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Track { args } => start_tracker(dir, args).await,
        Commands::Summary { command } => process_summary_command(&open_store(&dir)?, command).await,
        Commands::Search { command } => {
            process_search_command(&open_store(&dir)?, command, &DefaultClock).await
        }
        Commands::Totals { json } => {
            process_totals_command(&open_store(&dir)?, json, &DefaultClock).await
        }
        Commands::Reset { command } => {
            process_reset_command(&open_store(&dir)?, command, &DefaultClock).await
        }
    }
}

fn open_store(dir: &Path) -> Result<EntryStore<JsonFileStore>> {
    Ok(EntryStore::new(JsonFileStore::new(dir.join("store"))?))
}
