use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn valid_config_json() -> &'static str {
    r#"
{
  "version": 1,
  "city": "Makassar",
  "alarms": [
    { "time": "07:30" },
    { "time": "21:00", "enabled": false }
  ],
  "display": { "hour_mode": "24h" }
}
"#
}

#[test]
fn once_prints_countdown_to_next_alarm() {
    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.args([
        "--once",
        "--city",
        "jakarta",
        "--at",
        "2026-10-16T06:00:00",
        "--alarm",
        "07:00",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("06:00:00 WIB"))
    .stdout(predicate::str::contains("next 07:00 (alarm #1) in 01:00:00"));
}

#[test]
fn once_reads_config_file() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("config.json");
    fs::write(&config, valid_config_json()).expect("write json");

    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.arg("--once")
        .arg("--config")
        .arg(config)
        .args(["--at", "2026-10-16T07:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Makassar"))
        .stdout(predicate::str::contains("WITA"))
        .stdout(predicate::str::contains("next 07:30 (alarm #1) in 00:30:00"))
        .stdout(predicate::str::contains("21:00  off"));
}

#[test]
fn json_snapshot_uses_fallback_without_alarms() {
    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.args(["--json", "--city", "ambon", "--at", "2026-10-16T17:00:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"zone\": \"Asia/Jayapura\""))
        .stdout(predicate::str::contains("\"target_source\": \"Maghrib\""))
        .stdout(predicate::str::contains("\"countdown\": \"01:00:00\""));
}

#[test]
fn no_fallback_shows_placeholder() {
    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.args(["--once", "--no-fallback", "--at", "2026-10-16T06:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no alarm set --:--:--"));
}

#[test]
fn malformed_json_fails_with_clear_error() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("config.json");
    fs::write(&config, "{ not-valid-json ").expect("write invalid json");

    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.arg("--once")
        .arg("--config")
        .arg(config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn unknown_city_in_config_fails() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "version": 1, "city": "Atlantis" }"#).expect("write json");

    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.arg("--once")
        .arg("--config")
        .arg(config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown city 'Atlantis'"));
}

#[test]
fn invalid_at_value_fails() {
    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.args(["--once", "--at", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --at value"));
}

#[test]
fn list_cities_prints_catalogue() {
    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.arg("--list-cities")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pontianak"))
        .stdout(predicate::str::contains("Asia/Makassar"));
}

#[test]
fn interactive_session_accepts_commands() {
    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.args(["--mute", "--at", "2026-10-16T06:00:00"])
        .write_stdin("add 07:00\nlist\nbogus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("alarm #1 set for 07:00"))
        .stdout(predicate::str::contains("   1  07:00  armed"))
        .stdout(predicate::str::contains("unknown command 'bogus'"));
}

#[test]
fn interactive_session_ends_on_eof() {
    let mut cmd = cargo_bin_cmd!("adzanclock");
    cmd.args(["--mute", "--at", "2026-10-16T06:00:00"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Jakarta"));
}
