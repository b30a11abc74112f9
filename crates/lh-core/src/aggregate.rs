//! Group-by tallies over play events.
//!
//! Every ranking orders by value descending and breaks ties by key ascending
//! so output is stable across runs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use crate::event::{PlayEvent, TrackKey};

/// A key with its accumulated value (milliseconds or a play count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally<K> {
    pub key: K,
    pub total: u64,
}

/// What a track ranking accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Sum of milliseconds played.
    #[default]
    Playtime,
    /// Number of plays.
    PlayCount,
}

/// A calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Distinct artists and tracks heard in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UniqueCounts {
    pub artists: usize,
    pub tracks: usize,
}

/// Average listening for a month of the year across the years it occurs in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthAverage {
    /// 1 = January.
    pub month: u32,
    pub average_ms: f64,
}

/// Plays of one track on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub track: TrackKey,
    pub date: NaiveDate,
    pub plays: u64,
}

/// Plays of one track in one ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekRecord {
    pub track: TrackKey,
    pub year: i32,
    pub week: u32,
    pub plays: u64,
}

/// Sorts a tally by value descending, key ascending, keeping `top_n`.
pub fn rank<K: Ord>(tally: HashMap<K, u64>, top_n: usize) -> Vec<Tally<K>> {
    let mut ranked: Vec<Tally<K>> = tally
        .into_iter()
        .map(|(key, total)| Tally { key, total })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(top_n);
    ranked
}

fn tally_by<K, F>(events: &[PlayEvent], mut key_and_value: F) -> HashMap<K, u64>
where
    K: Eq + Hash,
    F: FnMut(&PlayEvent) -> Option<(K, u64)>,
{
    let mut tally = HashMap::new();
    for (key, value) in events.iter().filter_map(&mut key_and_value) {
        *tally.entry(key).or_insert(0) += value;
    }
    tally
}

/// Total milliseconds listened across all plays.
pub fn total_listening_ms(events: &[PlayEvent]) -> u64 {
    events.iter().map(|e| e.duration_played_ms).sum()
}

pub fn top_tracks_by_playtime(events: &[PlayEvent], top_n: usize) -> Vec<Tally<TrackKey>> {
    let tally = tally_by(events, |e| {
        e.has_playtime()
            .then(|| e.track_key())
            .flatten()
            .map(|k| (k, e.duration_played_ms))
    });
    rank(tally, top_n)
}

/// Play counts per track, not counting skipped plays.
pub fn top_tracks_by_play_count(events: &[PlayEvent], top_n: usize) -> Vec<Tally<TrackKey>> {
    let tally = tally_by(events, |e| {
        (!e.skipped).then(|| e.track_key()).flatten().map(|k| (k, 1))
    });
    rank(tally, top_n)
}

/// Tracks played in incognito mode, by the chosen metric.
pub fn top_incognito_tracks(
    events: &[PlayEvent],
    top_n: usize,
    metric: Metric,
) -> Vec<Tally<TrackKey>> {
    let tally = tally_by(events, |e| {
        if !e.incognito {
            return None;
        }
        let key = e.track_key()?;
        match metric {
            Metric::Playtime => e.has_playtime().then_some((key, e.duration_played_ms)),
            Metric::PlayCount => Some((key, 1)),
        }
    });
    rank(tally, top_n)
}

pub fn most_skipped_tracks(events: &[PlayEvent], top_n: usize) -> Vec<Tally<TrackKey>> {
    let tally = tally_by(events, |e| {
        e.skipped.then(|| e.track_key()).flatten().map(|k| (k, 1))
    });
    rank(tally, top_n)
}

pub fn top_artists_by_playtime(events: &[PlayEvent], top_n: usize) -> Vec<Tally<String>> {
    let tally = tally_by(events, |e| {
        if !e.has_playtime() {
            return None;
        }
        e.track_key().map(|k| (k.artist, e.duration_played_ms))
    });
    rank(tally, top_n)
}

/// Milliseconds listened per UTC hour of day. Only hours with listening appear.
pub fn listening_by_hour(events: &[PlayEvent]) -> BTreeMap<u32, u64> {
    let mut by_hour = BTreeMap::new();
    for event in events.iter().filter(|e| e.has_playtime()) {
        if let Some(ts) = event.timestamp {
            *by_hour.entry(ts.hour()).or_insert(0) += event.duration_played_ms;
        }
    }
    by_hour
}

/// For each month of the year, the mean listening over the years in which
/// that month has any listening. Months never listened in average to zero.
#[allow(clippy::cast_precision_loss)]
pub fn average_listening_by_month(events: &[PlayEvent]) -> Vec<MonthAverage> {
    let mut per_year_month: HashMap<YearMonth, u64> = HashMap::new();
    for event in events.iter().filter(|e| e.has_playtime()) {
        if let Some(ts) = event.timestamp {
            *per_year_month
                .entry(YearMonth::of(ts.date_naive()))
                .or_insert(0) += event.duration_played_ms;
        }
    }

    (1..=12)
        .map(|month| {
            let totals: Vec<u64> = per_year_month
                .iter()
                .filter(|(ym, _)| ym.month == month)
                .map(|(_, &ms)| ms)
                .collect();
            let average_ms = if totals.is_empty() {
                0.0
            } else {
                totals.iter().sum::<u64>() as f64 / totals.len() as f64
            };
            MonthAverage { month, average_ms }
        })
        .collect()
}

/// The track with the most playtime in each month.
pub fn favorite_track_per_month(events: &[PlayEvent]) -> BTreeMap<YearMonth, Tally<TrackKey>> {
    let mut per_month: BTreeMap<YearMonth, HashMap<TrackKey, u64>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.has_playtime()) {
        let (Some(ts), Some(key)) = (event.timestamp, event.track_key()) else {
            continue;
        };
        *per_month
            .entry(YearMonth::of(ts.date_naive()))
            .or_default()
            .entry(key)
            .or_insert(0) += event.duration_played_ms;
    }

    per_month
        .into_iter()
        .filter_map(|(month, tally)| rank(tally, 1).pop().map(|top| (month, top)))
        .collect()
}

/// Distinct artists and tracks per month.
pub fn unique_per_month(events: &[PlayEvent]) -> BTreeMap<YearMonth, UniqueCounts> {
    let mut seen: BTreeMap<YearMonth, (BTreeSet<String>, BTreeSet<TrackKey>)> = BTreeMap::new();
    for event in events {
        let (Some(ts), Some(key)) = (event.timestamp, event.track_key()) else {
            continue;
        };
        let (artists, tracks) = seen.entry(YearMonth::of(ts.date_naive())).or_default();
        artists.insert(key.artist.clone());
        tracks.insert(key);
    }

    seen.into_iter()
        .map(|(month, (artists, tracks))| {
            (
                month,
                UniqueCounts {
                    artists: artists.len(),
                    tracks: tracks.len(),
                },
            )
        })
        .collect()
}

/// Most non-skipped plays of a single track on a single day.
pub fn top_single_day_plays(events: &[PlayEvent], top_n: usize) -> Vec<DayRecord> {
    let tally = tally_by(events, |e| {
        if e.skipped {
            return None;
        }
        let ts = e.timestamp?;
        e.track_key().map(|k| ((k, ts.date_naive()), 1))
    });
    rank(tally, top_n)
        .into_iter()
        .map(|t| DayRecord {
            track: t.key.0,
            date: t.key.1,
            plays: t.total,
        })
        .collect()
}

/// Most non-skipped plays of a single track within one ISO week.
pub fn top_single_week_plays(events: &[PlayEvent], top_n: usize) -> Vec<WeekRecord> {
    let tally = tally_by(events, |e| {
        if e.skipped {
            return None;
        }
        let week = e.timestamp?.iso_week();
        e.track_key().map(|k| ((k, week.year(), week.week()), 1))
    });
    rank(tally, top_n)
        .into_iter()
        .map(|t| WeekRecord {
            track: t.key.0,
            year: t.key.1,
            week: t.key.2,
            plays: t.total,
        })
        .collect()
}
