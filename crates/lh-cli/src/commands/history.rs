//! Loading and date-filtering history for analysis commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;

use lh_core::{DateRange, PlayEvent, latest_timestamp, load_history_dir};

use super::util::parse_date;
use crate::Config;

/// Where to read history from and which days to keep.
#[derive(Debug, Clone, Default, Args)]
pub struct HistoryArgs {
    /// Directory containing `Streaming_History_Audio_*.json` files.
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// First day to include (YYYY-MM-DD or e.g. "90 days ago").
    #[arg(long)]
    pub start: Option<String>,

    /// Last day to include. Defaults to the configured last date, then the
    /// day of the latest play.
    #[arg(long)]
    pub end: Option<String>,

    /// Days to look back from the end date when --start is not given.
    #[arg(long)]
    pub days: Option<u32>,

    /// Analyze the whole history without date filtering.
    #[arg(long, conflicts_with_all = ["start", "end", "days"])]
    pub all: bool,
}

/// History after date filtering, with the range that was applied.
#[derive(Debug)]
pub struct LoadedHistory {
    pub events: Vec<PlayEvent>,
    pub range: Option<DateRange>,
}

impl LoadedHistory {
    /// Calendar days covered, for per-day averages.
    ///
    /// Uses the applied range, or the span of timed plays when unfiltered.
    pub fn days_covered(&self) -> i64 {
        if let Some(range) = self.range {
            return range.days();
        }
        let dates = self
            .events
            .iter()
            .filter_map(|e| e.timestamp.map(|t| t.date_naive()));
        match (dates.clone().min(), dates.max()) {
            (Some(first), Some(last)) => (last - first).num_days() + 1,
            _ => 1,
        }
    }
}

/// Resolves the date range to apply, or `None` for the whole history.
///
/// End: `--end`, then `last_date` from config, then the latest play, then
/// today. Start: `--start`, then `days` before the end.
pub fn resolve_range(
    args: &HistoryArgs,
    config: &Config,
    events: &[PlayEvent],
    today: NaiveDate,
) -> Result<Option<DateRange>> {
    if args.all {
        return Ok(None);
    }

    let end = match args.end.as_deref() {
        Some(s) => parse_date(s, today).context("invalid --end")?,
        None => config
            .last_date
            .or_else(|| latest_timestamp(events).map(|t| t.date_naive()))
            .unwrap_or(today),
    };

    let range = match args.start.as_deref() {
        Some(s) => {
            let start = parse_date(s, today).context("invalid --start")?;
            DateRange::new(start, end)?
        }
        None => DateRange::ending_at(end, args.days.unwrap_or(config.history_days))
            .context("invalid --days")?,
    };
    Ok(Some(range))
}

/// Loads the history directory and applies the resolved date range.
pub fn load(args: &HistoryArgs, config: &Config) -> Result<LoadedHistory> {
    let dir = args.dir.as_ref().unwrap_or(&config.history_dir);
    let all_events = load_history_dir(dir)
        .with_context(|| format!("failed to load history from {}", dir.display()))?;

    let today = Utc::now().date_naive();
    let range = resolve_range(args, config, &all_events, today)?;
    let events = match range {
        Some(range) => range.filter(&all_events),
        None => all_events,
    };

    tracing::debug!(
        events = events.len(),
        start = ?range.map(|r| r.start),
        end = ?range.map(|r| r.end),
        "history ready"
    );
    Ok(LoadedHistory { events, range })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event_on(y: i32, m: u32, d: u32) -> PlayEvent {
        PlayEvent {
            timestamp: Some(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
            duration_played_ms: 60_000,
            track_name: Some("Song".to_string()),
            artist_name: Some("Artist".to_string()),
            skipped: false,
            incognito: false,
        }
    }

    #[test]
    fn test_range_defaults_to_latest_play() {
        let events = vec![event_on(2024, 6, 1), event_on(2024, 6, 30)];
        let range = resolve_range(&HistoryArgs::default(), &Config::default(), &events, date(2025, 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(range.end, date(2024, 6, 30));
        assert_eq!(range.start, date(2023, 7, 1));
    }

    #[test]
    fn test_range_prefers_configured_last_date() {
        let config = Config {
            last_date: Some(date(2024, 3, 31)),
            ..Config::default()
        };
        let events = vec![event_on(2024, 6, 30)];
        let args = HistoryArgs {
            days: Some(30),
            ..HistoryArgs::default()
        };
        let range = resolve_range(&args, &config, &events, date(2025, 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(range.end, date(2024, 3, 31));
        assert_eq!(range.start, date(2024, 3, 1));
    }

    #[test]
    fn test_range_falls_back_to_today() {
        let range = resolve_range(&HistoryArgs::default(), &Config::default(), &[], date(2025, 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(range.end, date(2025, 1, 1));
    }

    #[test]
    fn test_explicit_bounds() {
        let args = HistoryArgs {
            start: Some("2024-01-01".to_string()),
            end: Some("2024-01-31".to_string()),
            ..HistoryArgs::default()
        };
        let range = resolve_range(&args, &Config::default(), &[], date(2025, 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(range.days(), 31);
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let args = HistoryArgs {
            start: Some("2024-02-01".to_string()),
            end: Some("2024-01-01".to_string()),
            ..HistoryArgs::default()
        };
        assert!(resolve_range(&args, &Config::default(), &[], date(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_unparseable_bound_is_rejected() {
        let args = HistoryArgs {
            start: Some("soonish".to_string()),
            ..HistoryArgs::default()
        };
        let err = resolve_range(&args, &Config::default(), &[], date(2025, 1, 1)).unwrap_err();
        assert!(err.to_string().contains("--start"));
    }

    #[test]
    fn test_oversized_lookback_is_rejected() {
        let args = HistoryArgs {
            days: Some(u32::MAX),
            ..HistoryArgs::default()
        };
        let err = resolve_range(&args, &Config::default(), &[], date(2025, 1, 1)).unwrap_err();
        assert!(err.to_string().contains("--days"));
    }

    #[test]
    fn test_default_window_covers_both_ends() {
        let range = resolve_range(&HistoryArgs::default(), &Config::default(), &[], date(2025, 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(range.days(), 366);
    }

    #[test]
    fn test_all_disables_filtering() {
        let args = HistoryArgs {
            all: true,
            ..HistoryArgs::default()
        };
        assert!(resolve_range(&args, &Config::default(), &[], date(2025, 1, 1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_days_covered_without_range_spans_plays() {
        let history = LoadedHistory {
            events: vec![event_on(2024, 1, 1), event_on(2024, 1, 10)],
            range: None,
        };
        assert_eq!(history.days_covered(), 10);

        let empty = LoadedHistory {
            events: vec![],
            range: None,
        };
        assert_eq!(empty.days_covered(), 1);
    }
}
