//! Continuous-listening streak detection.
//!
//! # Algorithm Summary
//!
//! 1. Turn every timed play with listening time into a `[start, end)` interval
//! 2. Sort intervals by start
//! 3. Sweep once, extending the open streak while the next interval starts no
//!    more than `max_gap` after the streak's furthest end
//!
//! "Top streaks" and "count streaks at least" are separate queries, each with
//! its own gap tolerance.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::event::PlayEvent;

/// The span a single play occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PlayInterval {
    /// Builds the interval for a play, if it has a timestamp and listening time.
    pub fn from_event(event: &PlayEvent) -> Option<Self> {
        let start = event.timestamp?;
        if !event.has_playtime() {
            return None;
        }
        let ms = i64::try_from(event.duration_played_ms).ok()?;
        let end = start.checked_add_signed(Duration::milliseconds(ms))?;
        Some(Self { start, end })
    }
}

/// A maximal run of plays merged under a gap tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Streak {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// One entry of the longest-streaks ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedStreak {
    /// 1-based position in the ranking.
    pub rank: usize,
    /// Length as `"{h}h {m}m"`, floored to the minute.
    pub duration: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Merges already-built intervals into streaks, in chronological order.
pub fn merge_intervals(mut intervals: Vec<PlayInterval>, max_gap: Duration) -> Vec<Streak> {
    intervals.sort_by_key(|i| i.start);

    let mut streaks: Vec<Streak> = Vec::new();
    let mut current: Option<Streak> = None;

    for interval in intervals {
        match current.as_mut() {
            None => {
                current = Some(Streak {
                    start: interval.start,
                    end: interval.end,
                });
            }
            Some(open) if interval.start - open.end <= max_gap => {
                // Contained plays must not pull the end backwards.
                open.end = open.end.max(interval.end);
            }
            Some(open) => {
                streaks.push(*open);
                *open = Streak {
                    start: interval.start,
                    end: interval.end,
                };
            }
        }
    }

    if let Some(open) = current {
        streaks.push(open);
    }
    streaks
}

/// Detects listening streaks in an unordered sequence of plays.
///
/// Plays without a timestamp or without listening time are ignored.
pub fn detect_streaks(events: &[PlayEvent], max_gap: Duration) -> Vec<Streak> {
    let intervals: Vec<PlayInterval> = events.iter().filter_map(PlayInterval::from_event).collect();
    let streaks = merge_intervals(intervals, max_gap);
    tracing::debug!(
        streaks = streaks.len(),
        max_gap_minutes = max_gap.num_minutes(),
        "detected streaks"
    );
    streaks
}

/// The `top_n` longest streaks, longest first.
///
/// Streaks of equal length keep their chronological order.
pub fn top_streaks(events: &[PlayEvent], max_gap: Duration, top_n: usize) -> Vec<RankedStreak> {
    let mut streaks = detect_streaks(events, max_gap);
    streaks.sort_by_key(|s| std::cmp::Reverse(s.duration()));

    streaks
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, streak)| RankedStreak {
            rank: idx + 1,
            duration: format_streak_duration(streak.duration()),
            start: streak.start,
            end: streak.end,
        })
        .collect()
}

/// Counts streaks lasting at least `min_duration`, merging with `max_gap`.
///
/// This recomputes the streaks; it does not reuse the result of any other
/// query.
pub fn count_streaks_at_least(
    events: &[PlayEvent],
    min_duration: Duration,
    max_gap: Duration,
) -> usize {
    detect_streaks(events, max_gap)
        .iter()
        .filter(|s| s.duration() >= min_duration)
        .count()
}

/// Formats a streak length as `"{h}h {m}m"`, flooring to the minute.
/// Negative lengths render as `"0h 0m"`.
pub fn format_streak_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}
