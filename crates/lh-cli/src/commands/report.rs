//! Report command for the full listening report.
//!
//! This module implements `lh report`, combining every ranking, distribution
//! and streak query over the selected date range, in human-readable or JSON
//! form.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, Month, Utc};
use clap::Args;
use serde::Serialize;

use lh_core::aggregate::{
    self, DayRecord, Metric, MonthAverage, Tally, UniqueCounts, WeekRecord, YearMonth,
};
use lh_core::{DateRange, PlayEvent, RankedStreak, TrackKey, co_occurrences};

use super::history::{self, HistoryArgs};
use super::streaks::format_streaks;
use super::together::{RelatedTracks, format_related, related_for};
use super::util::{format_duration, format_minutes, group_thousands};
use crate::Config;

#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Length of every ranked list.
    #[arg(long)]
    pub top: Option<usize>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Query parameters for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub streak_gap_minutes: u32,
    pub threshold_gap_minutes: u32,
    pub window_minutes: u32,
    pub related_tracks: usize,
}

impl ReportOptions {
    pub fn from_config(config: &Config, top: Option<usize>) -> Self {
        Self {
            top_n: top.unwrap_or(config.top_n),
            streak_gap_minutes: config.streak_gap_minutes,
            threshold_gap_minutes: config.threshold_gap_minutes,
            window_minutes: config.window_minutes,
            related_tracks: config.related_tracks,
        }
    }
}

/// Longest duration threshold, in hours, in the streak table.
pub const MAX_THRESHOLD_HOURS: u32 = 24;

/// Number of streaks lasting at least `hours`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdCount {
    pub hours: u32,
    pub count: usize,
}

/// Computed report data.
#[derive(Debug, Serialize)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub range: Option<DateRange>,
    pub days_covered: i64,
    pub total_listening_ms: u64,
    pub top_tracks_by_playtime: Vec<Tally<TrackKey>>,
    pub top_tracks_by_play_count: Vec<Tally<TrackKey>>,
    pub top_incognito_by_playtime: Vec<Tally<TrackKey>>,
    pub top_incognito_by_play_count: Vec<Tally<TrackKey>>,
    pub most_skipped: Vec<Tally<TrackKey>>,
    pub top_artists_by_playtime: Vec<Tally<String>>,
    pub streak_gap_minutes: u32,
    pub top_streaks: Vec<RankedStreak>,
    pub threshold_gap_minutes: u32,
    pub streak_thresholds: Vec<ThresholdCount>,
    pub listening_by_hour_ms: BTreeMap<u32, u64>,
    pub average_by_month: Vec<MonthAverage>,
    pub favorite_per_month: BTreeMap<YearMonth, Tally<TrackKey>>,
    pub unique_per_month: BTreeMap<YearMonth, UniqueCounts>,
    pub single_day_records: Vec<DayRecord>,
    pub single_week_records: Vec<WeekRecord>,
    pub window_minutes: u32,
    pub related: Vec<RelatedTracks>,
}

// ========== Report Generation ==========

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

fn hours(h: u32) -> Duration {
    Duration::hours(i64::from(h))
}

/// Generates report data from already-filtered events.
pub fn generate_report_data(
    events: &[PlayEvent],
    range: Option<DateRange>,
    days_covered: i64,
    options: ReportOptions,
    generated_at: DateTime<Utc>,
) -> ReportData {
    let top_n = options.top_n;
    let top_by_playtime = aggregate::top_tracks_by_playtime(events, top_n);

    // Hour thresholds 1..=top_n, each a fresh streak computation.
    let threshold_hours = u32::try_from(top_n).map_or(MAX_THRESHOLD_HOURS, |n| {
        n.min(MAX_THRESHOLD_HOURS)
    });
    let streak_thresholds = (1..=threshold_hours)
        .map(|h| ThresholdCount {
            hours: h,
            count: lh_core::count_streaks_at_least(
                events,
                hours(h),
                minutes(options.threshold_gap_minutes),
            ),
        })
        .collect();

    let table = co_occurrences(events, minutes(options.window_minutes));
    let top_keys: Vec<TrackKey> = top_by_playtime.iter().map(|t| t.key.clone()).collect();
    let related = related_for(&table, &top_keys, options.related_tracks);

    ReportData {
        generated_at,
        range,
        days_covered,
        total_listening_ms: aggregate::total_listening_ms(events),
        top_tracks_by_play_count: aggregate::top_tracks_by_play_count(events, top_n),
        top_incognito_by_playtime: aggregate::top_incognito_tracks(
            events,
            top_n,
            Metric::Playtime,
        ),
        top_incognito_by_play_count: aggregate::top_incognito_tracks(
            events,
            top_n,
            Metric::PlayCount,
        ),
        most_skipped: aggregate::most_skipped_tracks(events, top_n),
        top_artists_by_playtime: aggregate::top_artists_by_playtime(events, top_n),
        streak_gap_minutes: options.streak_gap_minutes,
        top_streaks: lh_core::top_streaks(events, minutes(options.streak_gap_minutes), top_n),
        threshold_gap_minutes: options.threshold_gap_minutes,
        streak_thresholds,
        listening_by_hour_ms: aggregate::listening_by_hour(events),
        average_by_month: aggregate::average_listening_by_month(events),
        favorite_per_month: aggregate::favorite_track_per_month(events),
        unique_per_month: aggregate::unique_per_month(events),
        single_day_records: aggregate::top_single_day_plays(events, top_n),
        single_week_records: aggregate::top_single_week_plays(events, top_n),
        window_minutes: options.window_minutes,
        related,
        top_tracks_by_playtime: top_by_playtime,
    }
}

// ========== Text Output ==========

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or("?", |m| m.name())
}

fn write_tally<K: std::fmt::Display>(
    output: &mut String,
    entries: &[Tally<K>],
    render: impl Fn(u64) -> String,
) {
    if entries.is_empty() {
        writeln!(output, "(none)").unwrap();
    }
    for (rank, entry) in entries.iter().enumerate() {
        writeln!(output, "{}. {} - {}", rank + 1, entry.key, render(entry.total)).unwrap();
    }
}

/// Formats the human-readable report output.
#[allow(clippy::cast_precision_loss)]
pub fn format_report(data: &ReportData, top_n: usize) -> String {
    let mut output = String::new();

    // Header
    match data.range {
        Some(range) => writeln!(
            output,
            "LISTENING REPORT: {} to {} ({} days, {:.2} years)",
            range.start,
            range.end,
            data.days_covered,
            data.days_covered as f64 / 365.0
        )
        .unwrap(),
        None => writeln!(output, "LISTENING REPORT: entire history ({} days)", data.days_covered)
            .unwrap(),
    }

    if data.total_listening_ms == 0 && data.top_tracks_by_play_count.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No plays recorded in this range.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Use --all or --start to widen the range.").unwrap();
        return output;
    }

    let total_minutes = data.total_listening_ms / 60_000;
    writeln!(output).unwrap();
    writeln!(
        output,
        "Total listening time: {} minutes ({})",
        group_thousands(total_minutes),
        format_duration(data.total_listening_ms)
    )
    .unwrap();

    let min = |ms: u64| format!("{} min", format_minutes(ms));

    writeln!(output).unwrap();
    writeln!(output, "Top {top_n} most listened songs by total playtime:").unwrap();
    write_tally(&mut output, &data.top_tracks_by_playtime, min);

    writeln!(output).unwrap();
    writeln!(
        output,
        "Top {top_n} most listened songs by number of plays (excluding skipped plays):"
    )
    .unwrap();
    write_tally(&mut output, &data.top_tracks_by_play_count, |n| format!("{n} plays"));

    writeln!(output).unwrap();
    writeln!(
        output,
        "Top {top_n} most listened songs in incognito mode by total playtime:"
    )
    .unwrap();
    write_tally(&mut output, &data.top_incognito_by_playtime, min);

    writeln!(output).unwrap();
    writeln!(output, "Top {top_n} most listened songs in incognito mode by play count:").unwrap();
    write_tally(&mut output, &data.top_incognito_by_play_count, |n| {
        format!("{n} plays")
    });

    writeln!(output).unwrap();
    writeln!(output, "Top {top_n} most skipped songs:").unwrap();
    write_tally(&mut output, &data.most_skipped, |n| format!("{n} skips"));

    writeln!(output).unwrap();
    writeln!(output, "Top {top_n} artists by total playtime:").unwrap();
    write_tally(&mut output, &data.top_artists_by_playtime, min);

    writeln!(output).unwrap();
    writeln!(
        output,
        "Top {top_n} longest continuous listening streaks (max {}-minute gap):",
        data.streak_gap_minutes
    )
    .unwrap();
    output.push_str(&format_streaks(&data.top_streaks));

    writeln!(output).unwrap();
    writeln!(
        output,
        "Listening streaks over duration thresholds (max {}-minute gap between tracks):",
        data.threshold_gap_minutes
    )
    .unwrap();
    writeln!(output, "{:<12} {:<6}", "Threshold", "Count").unwrap();
    writeln!(output, "{}", "-".repeat(20)).unwrap();
    for threshold in &data.streak_thresholds {
        let label = format!("{}h:00m", threshold.hours);
        writeln!(output, "{label:<12} {:<6}", threshold.count).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Listening time distribution by hour of day (UTC):").unwrap();
    writeln!(output, "{:<6} {:<20}", "Hour", "Avg min/day").unwrap();
    writeln!(output, "{}", "-".repeat(30)).unwrap();
    let days = data.days_covered.max(1) as f64;
    for (hour, ms) in &data.listening_by_hour_ms {
        let per_day = *ms as f64 / 60_000.0 / days;
        writeln!(output, "{hour:02}:00  {per_day:.2}").unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Average listening time by month of year (minutes):").unwrap();
    writeln!(output, "{:<10} {:<12}", "Month", "Avg Minutes").unwrap();
    writeln!(output, "{}", "-".repeat(24)).unwrap();
    for avg in &data.average_by_month {
        let avg_minutes = avg.average_ms / 60_000.0;
        writeln!(output, "{:<10} {avg_minutes:.2}", month_name(avg.month)).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Favorite song per month:").unwrap();
    writeln!(output, "{:<8} {:<10} Song", "Month", "Minutes").unwrap();
    writeln!(output, "{}", "-".repeat(75)).unwrap();
    for (month, favorite) in &data.favorite_per_month {
        writeln!(
            output,
            "{:<8} {:<10} {}",
            month.to_string(),
            format_minutes(favorite.total),
            favorite.key
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Unique artists and unique songs per month:").unwrap();
    writeln!(output, "{:<8} {:<15} {:<12}", "Month", "Unique Artists", "Unique Songs").unwrap();
    writeln!(output, "{}", "-".repeat(40)).unwrap();
    for (month, counts) in &data.unique_per_month {
        writeln!(
            output,
            "{:<8} {:<15} {}",
            month.to_string(),
            counts.artists,
            counts.tracks
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Top {top_n} most plays of a single song in one day:").unwrap();
    for record in &data.single_day_records {
        writeln!(
            output,
            "{} plays of '{}' on {}",
            record.plays, record.track, record.date
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Top {top_n} most plays of a single song in one week:").unwrap();
    for record in &data.single_week_records {
        writeln!(
            output,
            "{} plays of '{}' in week {} of {}",
            record.plays, record.track, record.week, record.year
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Songs often listened to together (in a {} minute time window) with your top songs:",
        data.window_minutes
    )
    .unwrap();
    output.push_str(&format_related(&data.related));

    output
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let loaded = history::load(&args.history, config)?;
    let options = ReportOptions::from_config(config, args.top);
    let data = generate_report_data(
        &loaded.events,
        loaded.range,
        loaded.days_covered(),
        options,
        Utc::now(),
    );

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data, options.top_n))?;
    }

    Ok(())
}
