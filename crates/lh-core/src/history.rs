//! Loading streaming-history export files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::{PlayEvent, RawPlayRecord};

/// File name prefix of audio history files in an export.
pub const HISTORY_FILE_PREFIX: &str = "Streaming_History_Audio_";

/// File name suffix of audio history files in an export.
pub const HISTORY_FILE_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a list of records at the top level")]
    NotAList,
}

/// Returns true if `name` looks like an audio history file.
pub fn is_history_file_name(name: &str) -> bool {
    name.starts_with(HISTORY_FILE_PREFIX) && name.ends_with(HISTORY_FILE_SUFFIX)
}

/// Parses the contents of one history file.
///
/// Records that fail to deserialize are skipped with a warning.
pub fn parse_history(json: &str) -> Result<Vec<PlayEvent>, HistoryError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(records) = value else {
        return Err(HistoryError::NotAList);
    };

    let mut events = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<RawPlayRecord>(record) {
            Ok(raw) => events.push(PlayEvent::from(raw)),
            Err(e) => tracing::warn!(index = idx, error = %e, "skipping malformed record"),
        }
    }
    Ok(events)
}

/// Loads a single history file.
pub fn load_history_file(path: &Path) -> Result<Vec<PlayEvent>, HistoryError> {
    let contents = fs::read_to_string(path)?;
    parse_history(&contents)
}

/// Loads every audio history file in `dir`, in file name order.
///
/// Files that cannot be read or parsed are logged and skipped; only a failure
/// to list the directory itself is an error.
pub fn load_history_dir(dir: &Path) -> Result<Vec<PlayEvent>, HistoryError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_history_file_name);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut history = Vec::new();
    for path in &files {
        match load_history_file(path) {
            Ok(events) => {
                tracing::debug!(file = %path.display(), records = events.len(), "loaded history file");
                history.extend(events);
            }
            Err(HistoryError::NotAList) => {
                tracing::warn!(file = %path.display(), "unexpected format, skipping");
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "failed to read history file, skipping");
            }
        }
    }

    tracing::debug!(files = files.len(), events = history.len(), "history loaded");
    Ok(history)
}

/// Latest valid timestamp in the history.
pub fn latest_timestamp(events: &[PlayEvent]) -> Option<DateTime<Utc>> {
    events.iter().filter_map(|e| e.timestamp).max()
}
