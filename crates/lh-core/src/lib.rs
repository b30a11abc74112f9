//! Core analysis logic for listening history statistics.
//!
//! This crate contains the fundamental types and logic for:
//! - Loading: reading streaming-history exports into play events
//! - Filtering: restricting history to a calendar-day range
//! - Aggregation: top tracks/artists, skips, hourly and monthly distributions
//! - Streaks: merging plays into continuous listening sessions
//! - Co-occurrence: tracks played close together in time

pub mod aggregate;
pub mod cooccurrence;
pub mod event;
pub mod history;
pub mod range;
pub mod streak;

pub use cooccurrence::{CoOccurrence, Partner, co_occurrences};
pub use event::{PlayEvent, RawPlayRecord, TrackKey};
pub use history::{HistoryError, latest_timestamp, load_history_dir, load_history_file};
pub use range::{DateRange, RangeError};
pub use streak::{
    PlayInterval, RankedStreak, Streak, count_streaks_at_least, detect_streaks, top_streaks,
};
