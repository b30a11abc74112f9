//! Configuration loading and management.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
///
/// Every value here is a default for a query parameter; command-line flags
/// take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `Streaming_History_Audio_*.json` files.
    pub history_dir: PathBuf,
    /// Length of every ranked list.
    pub top_n: usize,
    /// Days of history to analyze, counted back from the end date.
    pub history_days: u32,
    /// Fixed end date for the analyzed range. Defaults to the latest play.
    #[serde(default)]
    pub last_date: Option<NaiveDate>,
    /// Gap tolerance for the longest-streaks ranking.
    pub streak_gap_minutes: u32,
    /// Gap tolerance for the streak threshold table.
    pub threshold_gap_minutes: u32,
    /// Co-occurrence window.
    pub window_minutes: u32,
    /// Partners shown per track in co-occurrence output.
    pub related_tracks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_dir: PathBuf::from("."),
            top_n: 10,
            history_days: 365,
            last_date: None,
            streak_gap_minutes: 30,
            threshold_gap_minutes: 10,
            window_minutes: 30,
            related_tracks: 3,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // LH_TOP_N, LH_HISTORY_DIR, ...
        figment = figment.merge(Env::prefixed("LH_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for lh.
///
/// On Linux: `~/.config/lh`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("lh"))
}
