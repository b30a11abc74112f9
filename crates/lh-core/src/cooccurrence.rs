//! Tracks listened to together within a sliding time window.
//!
//! Every timed play anchors its own forward window `[t, t + window]`. The
//! distinct valid tracks in that window are paired up and each pair is
//! counted once for the anchor. Windows of nearby anchors overlap, so a pair
//! of plays close together is usually counted by several anchors.
//!
//! Plays with no listening time take no part at all: they neither anchor a
//! window nor join one, the same as in streak detection.
//!
//! The sweep is O(n·w) where w is the average window population.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::event::{PlayEvent, TrackKey};

/// A track paired with how many windows it shared with another track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partner {
    pub track: TrackKey,
    pub count: u32,
}

/// Symmetric co-occurrence counts between tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoOccurrence {
    counts: HashMap<TrackKey, HashMap<TrackKey, u32>>,
}

impl CoOccurrence {
    /// Number of windows in which both `a` and `b` appeared.
    pub fn count(&self, a: &TrackKey, b: &TrackKey) -> u32 {
        self.counts
            .get(a)
            .and_then(|partners| partners.get(b))
            .copied()
            .unwrap_or(0)
    }

    /// Partners of `track`, most frequent first, ties by track.
    pub fn partners(&self, track: &TrackKey) -> Vec<Partner> {
        let Some(partners) = self.counts.get(track) else {
            return Vec::new();
        };
        let mut ranked: Vec<Partner> = partners
            .iter()
            .map(|(other, &count)| Partner {
                track: other.clone(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.track.cmp(&b.track)));
        ranked
    }

    /// Every track with at least one partner, with its ranked partners,
    /// ordered by track.
    pub fn ranked(&self) -> Vec<(TrackKey, Vec<Partner>)> {
        let mut tracks: Vec<&TrackKey> = self.counts.keys().collect();
        tracks.sort();
        tracks
            .into_iter()
            .map(|track| (track.clone(), self.partners(track)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    fn record_pair(&mut self, a: &TrackKey, b: &TrackKey) {
        *self
            .counts
            .entry(a.clone())
            .or_default()
            .entry(b.clone())
            .or_insert(0) += 1;
        *self
            .counts
            .entry(b.clone())
            .or_default()
            .entry(a.clone())
            .or_insert(0) += 1;
    }
}

/// A timed play reduced to what the sweep needs. `track` is `None` for plays
/// that occupy the timeline but cannot join a window (skipped or unnamed).
struct TimedPlay {
    at: DateTime<Utc>,
    track: Option<TrackKey>,
}

/// Counts, for each pair of tracks, the anchor windows containing both.
///
/// Plays without a timestamp or without listening time are dropped. Skipped
/// plays and plays missing track or artist still anchor a window but never
/// join one. The input slice is not modified.
pub fn co_occurrences(events: &[PlayEvent], window: Duration) -> CoOccurrence {
    let mut plays: Vec<TimedPlay> = events
        .iter()
        .filter(|e| e.has_playtime())
        .filter_map(|e| {
            let at = e.timestamp?;
            let track = if e.skipped { None } else { e.track_key() };
            Some(TimedPlay { at, track })
        })
        .collect();
    // Stable: equal timestamps keep input order.
    plays.sort_by_key(|p| p.at);

    let mut table = CoOccurrence::default();
    let mut window_end_idx = 0;

    for (anchor_idx, anchor) in plays.iter().enumerate() {
        let window_end = anchor.at + window;
        // The upper bound only moves forward because anchors are sorted.
        window_end_idx = window_end_idx.max(anchor_idx);
        while window_end_idx < plays.len() && plays[window_end_idx].at <= window_end {
            window_end_idx += 1;
        }

        let members: BTreeSet<&TrackKey> = plays[anchor_idx..window_end_idx]
            .iter()
            .filter_map(|p| p.track.as_ref())
            .collect();
        let members: Vec<&TrackKey> = members.into_iter().collect();

        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                table.record_pair(a, b);
            }
        }
    }

    tracing::debug!(
        plays = plays.len(),
        tracks = table.len(),
        window_minutes = window.num_minutes(),
        "computed co-occurrences"
    );
    table
}
