//! Play events as read from a streaming-history export.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Composite identity of a track: the track title together with its artist.
///
/// Two plays belong to the same track only if both components match exactly.
/// The `"{track} by {artist}"` rendering is for display only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackKey {
    pub track: String,
    pub artist: String,
}

impl TrackKey {
    pub fn new(track: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            artist: artist.into(),
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.track, self.artist)
    }
}

/// One raw record of the export format. Unknown fields are ignored, and a
/// field holding a value of the wrong type reads as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub ts: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ms_played: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub master_metadata_track_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub master_metadata_album_artist_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub skipped: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub incognito_mode: Option<bool>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A normalized play event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayEvent {
    /// When playback started, truncated to whole seconds. `None` if the
    /// record's timestamp was missing or unparseable.
    pub timestamp: Option<DateTime<Utc>>,
    /// Milliseconds actually played. Zero means no listening time.
    pub duration_played_ms: u64,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub skipped: bool,
    pub incognito: bool,
}

impl PlayEvent {
    /// Returns the track identity, or `None` if track or artist is missing.
    pub fn track_key(&self) -> Option<TrackKey> {
        match (self.track_name.as_deref(), self.artist_name.as_deref()) {
            (Some(track), Some(artist)) => Some(TrackKey::new(track, artist)),
            _ => None,
        }
    }

    /// True if the play carries listening time.
    pub const fn has_playtime(&self) -> bool {
        self.duration_played_ms > 0
    }
}

impl From<RawPlayRecord> for PlayEvent {
    fn from(raw: RawPlayRecord) -> Self {
        Self {
            timestamp: raw.ts.as_deref().and_then(parse_timestamp),
            duration_played_ms: raw
                .ms_played
                .and_then(|ms| u64::try_from(ms).ok())
                .unwrap_or(0),
            track_name: non_empty(raw.master_metadata_track_name),
            artist_name: non_empty(raw.master_metadata_album_artist_name),
            skipped: raw.skipped.unwrap_or(false),
            incognito: raw.incognito_mode.unwrap_or(false),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Parses an export timestamp such as `2024-03-01T18:22:05Z`.
///
/// Accepts RFC 3339 with any offset, or a naive `YYYY-MM-DDTHH:MM:SS` which is
/// taken as UTC. Sub-second precision is dropped.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
