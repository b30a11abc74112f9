//! End-to-end tests for the `lh` binary.
//!
//! Each test writes a small streaming-history export into a temp directory
//! and runs the binary against it with an isolated HOME.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn lh_binary() -> String {
    env!("CARGO_BIN_EXE_lh").to_string()
}

/// Plays on 2024-05-01 form one session, with a lone play two days later.
const FIRST_FILE: &str = r#"[
    {"ts": "2024-05-01T10:00:00Z", "ms_played": 1200000,
     "master_metadata_track_name": "Alpha", "master_metadata_album_artist_name": "Band",
     "skipped": false, "incognito_mode": false},
    {"ts": "2024-05-01T10:25:00Z", "ms_played": 1800000,
     "master_metadata_track_name": "Bravo", "master_metadata_album_artist_name": "Band",
     "skipped": false, "incognito_mode": false}
]"#;

const SECOND_FILE: &str = r#"[
    {"ts": "2024-05-01T10:40:00Z", "ms_played": 180000,
     "master_metadata_track_name": "Charlie", "master_metadata_album_artist_name": "Band",
     "skipped": null, "incognito_mode": false},
    {"ts": "2024-05-03T20:00:00Z", "ms_played": 300000,
     "master_metadata_track_name": "Alpha", "master_metadata_album_artist_name": "Band",
     "skipped": false, "incognito_mode": true},
    {"ts": "not a time", "ms_played": 60000,
     "master_metadata_track_name": "Untimed", "master_metadata_album_artist_name": "Band",
     "skipped": false, "incognito_mode": false}
]"#;

fn write_export(dir: &Path) {
    std::fs::write(dir.join("Streaming_History_Audio_2024_0.json"), FIRST_FILE).unwrap();
    std::fs::write(dir.join("Streaming_History_Audio_2024_1.json"), SECOND_FILE).unwrap();
    // Ignored: not an audio history file.
    std::fs::write(dir.join("Userdata.json"), "{}").unwrap();
}

fn run_lh(home: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(lh_binary());
    command
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("LH_") {
            command.env_remove(key);
        }
    }
    command.args(args).output().expect("failed to run lh")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "lh should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn setup() -> (TempDir, String) {
    let temp = TempDir::new().unwrap();
    let export = temp.path().join("export");
    std::fs::create_dir(&export).unwrap();
    write_export(&export);
    let dir = export.to_string_lossy().into_owned();
    (temp, dir)
}

#[test]
fn test_streaks_top_text() {
    let (temp, dir) = setup();
    let out = stdout(&run_lh(temp.path(), &["streaks", "top", "--dir", &dir]));

    assert!(out.contains("Top 10 longest continuous listening streaks (max 30-minute gap):"));
    assert!(out.contains("1. Duration: 0h 55m | From: 2024-05-01 10:00 to 2024-05-01 10:55"));
    assert!(out.contains("2. Duration: 0h 5m | From: 2024-05-03 20:00 to 2024-05-03 20:05"));
}

#[test]
fn test_streaks_top_json() {
    let (temp, dir) = setup();
    let out = stdout(&run_lh(
        temp.path(),
        &["streaks", "top", "--dir", &dir, "--top", "1", "--json"],
    ));

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let streaks = json.as_array().unwrap();
    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0]["rank"], 1);
    assert_eq!(streaks[0]["duration"], "0h 55m");
}

#[test]
fn test_streaks_count() {
    let (temp, dir) = setup();
    let out = stdout(&run_lh(
        temp.path(),
        &["streaks", "count", "--dir", &dir, "--min", "30", "--json"],
    ));

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["min_duration_minutes"], 30);
    assert_eq!(json["max_gap_minutes"], 10);
}

#[test]
fn test_date_bounds_filter_plays() {
    let (temp, dir) = setup();
    let out = stdout(&run_lh(
        temp.path(),
        &[
            "streaks", "top", "--dir", &dir, "--start", "2024-05-02", "--end", "2024-05-03",
            "--json",
        ],
    ));

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let streaks = json.as_array().unwrap();
    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0]["duration"], "0h 5m");
}

#[test]
fn test_together_for_named_track() {
    let (temp, dir) = setup();
    let out = stdout(&run_lh(
        temp.path(),
        &["together", "--dir", &dir, "--track", "bravo"],
    ));

    assert!(out.contains("Songs often listened to together (in a 30 minute time window):"));
    assert!(out.contains("Bravo by Band:\n  - Alpha by Band (1 times)\n  - Charlie by Band (1 times)\n"));
}

#[test]
fn test_report_json() {
    let (temp, dir) = setup();
    let out = stdout(&run_lh(temp.path(), &["report", "--dir", &dir, "--all", "--json"]));

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(json["range"].is_null());
    // 20 + 30 + 3 + 5 timed minutes plus the untimed minute.
    assert_eq!(json["total_listening_ms"], 59 * 60_000);
    assert_eq!(json["top_tracks_by_playtime"][0]["key"]["track"], "Bravo");
    assert_eq!(json["top_incognito_by_play_count"][0]["key"]["track"], "Alpha");
    assert_eq!(json["days_covered"], 3);
}

#[test]
fn test_report_text() {
    let (temp, dir) = setup();
    let out = stdout(&run_lh(temp.path(), &["report", "--dir", &dir, "--top", "3"]));

    assert!(out.starts_with("LISTENING REPORT: 2023-05-04 to 2024-05-03"));
    assert!(out.contains("Top 3 most listened songs by total playtime:"));
    assert!(out.contains("1. Bravo by Band - 30.00 min"));
}

#[test]
fn test_config_file_sets_defaults() {
    let (temp, dir) = setup();
    let config_path = temp.path().join("lh.toml");
    std::fs::write(
        &config_path,
        format!("history_dir = {dir:?}\ntop_n = 1\nstreak_gap_minutes = 1\n"),
    )
    .unwrap();
    let config_arg = config_path.to_string_lossy().into_owned();

    let out = stdout(&run_lh(
        temp.path(),
        &["--config", &config_arg, "streaks", "top", "--json"],
    ));

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let streaks = json.as_array().unwrap();
    assert_eq!(streaks.len(), 1);
    // With a one-minute gap only Bravo's 30 minutes remain the longest run.
    assert_eq!(streaks[0]["duration"], "0h 30m");
}

#[test]
fn test_invalid_start_fails() {
    let (temp, dir) = setup();
    let output = run_lh(
        temp.path(),
        &["streaks", "top", "--dir", &dir, "--start", "someday"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid --start"), "stderr: {stderr}");
}

#[test]
fn test_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nowhere").to_string_lossy().into_owned();
    let output = run_lh(temp.path(), &["report", "--dir", &missing]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load history"), "stderr: {stderr}");
}

#[test]
fn test_all_conflicts_with_start() {
    let (temp, dir) = setup();
    let output = run_lh(
        temp.path(),
        &["report", "--dir", &dir, "--all", "--start", "2024-01-01"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_no_subcommand_prints_help() {
    let temp = TempDir::new().unwrap();
    let out = stdout(&run_lh(temp.path(), &[]));
    assert!(out.contains("Usage:"));
}
