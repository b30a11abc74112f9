//! `lh streaks`: continuous listening sessions.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::Duration;
use clap::Args;
use serde::Serialize;

use lh_core::{RankedStreak, count_streaks_at_least, top_streaks};

use super::history::{self, HistoryArgs};
use crate::Config;

/// Timestamp layout for streak boundaries.
pub const STREAK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Default, Args)]
pub struct StreaksTopArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Longest silence, in minutes, that still continues a streak.
    #[arg(long)]
    pub gap: Option<u32>,

    /// Number of streaks to show.
    #[arg(long)]
    pub top: Option<usize>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct StreaksCountArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Minimum streak length in minutes.
    #[arg(long)]
    pub min: u32,

    /// Longest silence, in minutes, that still continues a streak.
    #[arg(long)]
    pub gap: Option<u32>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON shape of a threshold query.
#[derive(Debug, Serialize)]
pub struct StreakCount {
    pub min_duration_minutes: u32,
    pub max_gap_minutes: u32,
    pub count: usize,
}

/// Formats ranked streaks, one per line.
pub fn format_streaks(streaks: &[RankedStreak]) -> String {
    let mut output = String::new();
    for streak in streaks {
        writeln!(
            output,
            "{}. Duration: {} | From: {} to {}",
            streak.rank,
            streak.duration,
            streak.start.format(STREAK_TIME_FORMAT),
            streak.end.format(STREAK_TIME_FORMAT)
        )
        .unwrap();
    }
    output
}

/// Runs `lh streaks top`.
pub fn run_top<W: Write>(writer: &mut W, args: &StreaksTopArgs, config: &Config) -> Result<()> {
    let loaded = history::load(&args.history, config)?;
    let gap = args.gap.unwrap_or(config.streak_gap_minutes);
    let top_n = args.top.unwrap_or(config.top_n);

    let streaks = top_streaks(&loaded.events, Duration::minutes(i64::from(gap)), top_n);

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&streaks)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Top {top_n} longest continuous listening streaks (max {gap}-minute gap):"
    )?;
    if streaks.is_empty() {
        writeln!(writer, "No listening streaks found.")?;
    } else {
        write!(writer, "{}", format_streaks(&streaks))?;
    }
    Ok(())
}

/// Runs `lh streaks count`.
pub fn run_count<W: Write>(writer: &mut W, args: &StreaksCountArgs, config: &Config) -> Result<()> {
    let loaded = history::load(&args.history, config)?;
    let gap = args.gap.unwrap_or(config.threshold_gap_minutes);

    let count = count_streaks_at_least(
        &loaded.events,
        Duration::minutes(i64::from(args.min)),
        Duration::minutes(i64::from(gap)),
    );

    if args.json {
        let result = StreakCount {
            min_duration_minutes: args.min,
            max_gap_minutes: gap,
            count,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        writeln!(
            writer,
            "{count} streaks of at least {} (max {gap}-minute gap)",
            lh_core::streak::format_streak_duration(Duration::minutes(i64::from(args.min)))
        )?;
    }
    Ok(())
}
