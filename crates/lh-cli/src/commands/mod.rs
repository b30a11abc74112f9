//! CLI subcommand implementations.

pub mod history;
pub mod report;
pub mod streaks;
pub mod together;
pub mod util;
