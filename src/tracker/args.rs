use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};
use clap::value_parser;

use super::triggers::{TriggerConfig, DEFAULT_FLUSH_TICKS};

#[derive(clap::Args, Debug, Clone)]
pub struct TrackerArgs {
    #[arg(
        long = "workspace",
        short,
        help = "Workspace folder opened in the editor. The first one names the project"
    )]
    pub workspace: Vec<PathBuf>,
    #[arg(long, help = "Editor window already has focus, start tracking immediately")]
    pub focused: bool,
    #[arg(
        long = "tick-ms",
        default_value_t = 1000,
        value_parser = value_parser!(u64).range(1..),
        help = "Interval between status updates in milliseconds"
    )]
    pub tick_ms: u64,
    #[arg(
        long = "flush-ticks",
        default_value_t = DEFAULT_FLUSH_TICKS,
        value_parser = value_parser!(u32).range(1..),
        help = "Number of status ticks between saves of the running session"
    )]
    pub flush_ticks: u32,
}

impl TrackerArgs {
    pub fn trigger_config(&self) -> Result<TriggerConfig> {
        TriggerConfig::new_opt(Duration::from_millis(self.tick_ms), self.flush_ticks).ok_or_else(
            || {
                anyhow!(
                    "Can't create triggers using {}ms and {} ticks",
                    self.tick_ms,
                    self.flush_ticks
                )
            },
        )
    }
}
