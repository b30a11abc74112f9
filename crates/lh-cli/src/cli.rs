//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::report::ReportArgs;
use crate::commands::streaks::{StreaksCountArgs, StreaksTopArgs};
use crate::commands::together::TogetherArgs;

/// Listening history statistics.
///
/// Reads a streaming-history export and reports top tracks and artists,
/// listening streaks, and tracks played together.
#[derive(Debug, Parser)]
#[command(name = "lh", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the full listening report.
    Report(ReportArgs),

    /// Continuous listening streaks.
    #[command(subcommand)]
    Streaks(StreaksAction),

    /// Tracks often played close together in time.
    Together(TogetherArgs),
}

/// Streak queries.
#[derive(Debug, Subcommand)]
pub enum StreaksAction {
    /// Show the longest streaks.
    Top(StreaksTopArgs),

    /// Count streaks lasting at least a given length.
    Count(StreaksCountArgs),
}
