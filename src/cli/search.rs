use std::fmt::{Display, Write};

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    storage::{
        entities::TimeEntry,
        entry_store::{EntryFilter, EntryStore},
        KeyValueStore,
    },
    summary::total,
    utils::{clock::Clock, time::format_hours_minutes},
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct SearchCommand {
    #[arg(
        long = "start",
        short,
        help = "First day of the range, inclusive. Examples are \"2025-03-15\", \"yesterday\", \"3 days ago\", \"15/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "Last day of the range, inclusive. Same formats as --start"
    )]
    end_date: Option<String>,
    #[arg(long, short, help = "Case-insensitive part of the project name")]
    project: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Print as JSON")]
    json: bool,
}

/// Command to process `search`. Lists entries matching the day range and project.
pub async fn process_search_command(
    store: &EntryStore<impl KeyValueStore>,
    SearchCommand {
        start_date,
        end_date,
        project,
        date_style,
        json,
    }: SearchCommand,
    clock: &dyn Clock,
) -> Result<()> {
    let now = clock.time();
    let filter = EntryFilter {
        start: start_date
            .map(|s| parse_day("start", &s, now, date_style))
            .transpose()?,
        end: end_date
            .map(|s| parse_day("end", &s, now, date_style))
            .transpose()?,
        project,
    };

    let entries = store.search_entries(&filter).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render_entries(&entries)?);
    }
    Ok(())
}

/// Accepts ISO days first, anything else goes through natural language parsing relative to
/// `now`.
fn parse_day(
    name: &str,
    value: &str,
    now: DateTime<Local>,
    date_style: DateStyle,
) -> Result<NaiveDate> {
    if let Ok(day) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return Ok(day);
    }
    match parse_date_string(value, now, date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate {name} date {e}"),
            )
            .into()),
    }
}

fn render_entries(entries: &[TimeEntry]) -> Result<String> {
    let mut out = String::new();
    for entry in entries {
        writeln!(
            out,
            "{}\t{}\t{}",
            entry.date,
            format_hours_minutes(entry.time_spent),
            entry.project
        )?;
    }
    writeln!(out, "Total\t{}", format_hours_minutes(total(entries)))?;
    Ok(out)
}
