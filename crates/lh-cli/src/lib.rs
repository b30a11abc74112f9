//! Listening history CLI library.
//!
//! This crate provides the CLI interface for the listening history analyzer.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, StreaksAction};
pub use config::Config;
