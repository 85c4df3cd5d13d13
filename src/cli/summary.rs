use std::fmt::Write;

use anyhow::Result;
use clap::Parser;

use crate::{
    storage::{entry_store::EntryStore, KeyValueStore},
    summary::{
        analysis::{project_shares, recent_days},
        period::{Period, PeriodTotals},
        summarize, SummaryData,
    },
    utils::{clock::Clock, percentage::Percentage, time::format_hours_minutes},
};

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(long, default_value_t = 7, help = "Number of most recent days to list")]
    days: usize,
    #[arg(short = 'p', long = "percentage", help = "Only list projects with at least this share of the total", default_value_t = Percentage::ZERO)]
    min_percentage: Percentage,
    #[arg(long, help = "Print as JSON")]
    json: bool,
}

/// Command to process `summary`. Prints the same tables the editor's summary view shows.
pub async fn process_summary_command(
    store: &EntryStore<impl KeyValueStore>,
    SummaryCommand {
        days,
        min_percentage,
        json,
    }: SummaryCommand,
) -> Result<()> {
    let summary = summarize(&store.entries().await?);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary, days, min_percentage)?);
    }
    Ok(())
}

fn render_summary(summary: &SummaryData, days: usize, min_percentage: Percentage) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Total Time: {}", format_hours_minutes(summary.grand_total))?;
    writeln!(out)?;

    writeln!(out, "Project Summary")?;
    for share in project_shares(summary, min_percentage) {
        writeln!(
            out,
            "{}\t{:.0}%\t{}",
            format_hours_minutes(share.minutes),
            *share.percentage,
            share.project
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Daily Summary (Last {days} Days)")?;
    for (day, minutes) in recent_days(summary, days) {
        writeln!(out, "{}\t{}", day, format_hours_minutes(minutes))?;
    }
    Ok(out)
}

/// Command to process `totals`. Only persisted time is counted, a running tracker adds its
/// unsaved minutes on its own status line.
pub async fn process_totals_command(
    store: &EntryStore<impl KeyValueStore>,
    json: bool,
    clock: &dyn Clock,
) -> Result<()> {
    let totals = PeriodTotals::compute(&store.entries().await?, &clock.time());
    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else {
        print!("{}", render_totals(&totals)?);
    }
    Ok(())
}

fn render_totals(totals: &PeriodTotals) -> Result<String> {
    let mut out = String::new();
    for period in Period::ALL {
        writeln!(out, "{}\t{}", period, format_hours_minutes(totals.get(period)))?;
    }
    Ok(out)
}
