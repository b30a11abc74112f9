//! `lh together`: tracks often played close together in time.

use std::io::Write;

use anyhow::Result;
use chrono::Duration;
use clap::Args;
use serde::Serialize;

use lh_core::aggregate::top_tracks_by_playtime;
use lh_core::{CoOccurrence, Partner, PlayEvent, TrackKey, co_occurrences};

use super::history::{self, HistoryArgs};
use crate::Config;

#[derive(Debug, Clone, Default, Args)]
pub struct TogetherArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Window length in minutes, forward from each play.
    #[arg(long)]
    pub window: Option<u32>,

    /// Show tracks whose title contains this text instead of the top tracks.
    #[arg(long)]
    pub track: Option<String>,

    /// Number of top tracks to show partners for.
    #[arg(long)]
    pub top: Option<usize>,

    /// Partners listed per track.
    #[arg(long)]
    pub related: Option<usize>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// A track with the tracks most often heard around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedTracks {
    pub track: TrackKey,
    pub partners: Vec<Partner>,
}

/// Picks partners for each of `tracks`, skipping tracks with none.
pub fn related_for(table: &CoOccurrence, tracks: &[TrackKey], limit: usize) -> Vec<RelatedTracks> {
    tracks
        .iter()
        .filter_map(|track| {
            let mut partners = table.partners(track);
            if partners.is_empty() {
                return None;
            }
            partners.truncate(limit);
            Some(RelatedTracks {
                track: track.clone(),
                partners,
            })
        })
        .collect()
}

/// Tracks from the table whose title contains `needle`, case-insensitively,
/// ordered by track.
fn matching_tracks(table: &CoOccurrence, needle: &str, limit: usize) -> Vec<RelatedTracks> {
    let needle = needle.to_lowercase();
    table
        .ranked()
        .into_iter()
        .filter(|(track, _)| track.track.to_lowercase().contains(&needle))
        .map(|(track, mut partners)| {
            partners.truncate(limit);
            RelatedTracks { track, partners }
        })
        .collect()
}

/// Computes related tracks for the given options.
pub fn compute(events: &[PlayEvent], args: &TogetherArgs, config: &Config) -> Vec<RelatedTracks> {
    let window = Duration::minutes(i64::from(args.window.unwrap_or(config.window_minutes)));
    let table = co_occurrences(events, window);

    let limit = args.related.unwrap_or(config.related_tracks);

    if let Some(needle) = args.track.as_deref() {
        return matching_tracks(&table, needle, limit);
    }
    let top: Vec<TrackKey> = top_tracks_by_playtime(events, args.top.unwrap_or(config.top_n))
        .into_iter()
        .map(|t| t.key)
        .collect();
    related_for(&table, &top, limit)
}

/// Formats related tracks as indented text.
pub fn format_related(related: &[RelatedTracks]) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    for entry in related {
        writeln!(output, "{}:", entry.track).unwrap();
        for partner in &entry.partners {
            writeln!(output, "  - {} ({} times)", partner.track, partner.count).unwrap();
        }
    }
    output
}

/// Runs the together command.
pub fn run<W: Write>(writer: &mut W, args: &TogetherArgs, config: &Config) -> Result<()> {
    let loaded = history::load(&args.history, config)?;
    let related = compute(&loaded.events, args, config);

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&related)?)?;
        return Ok(());
    }

    let window = args.window.unwrap_or(config.window_minutes);
    writeln!(
        writer,
        "Songs often listened to together (in a {window} minute time window):"
    )?;
    if related.is_empty() {
        writeln!(writer, "No tracks were played together.")?;
    } else {
        write!(writer, "{}", format_related(&related))?;
    }
    Ok(())
}
