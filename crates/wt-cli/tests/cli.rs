//! CLI command integration tests.
//! Each test writes its own dataset into a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MANIFEST: &str = "\
locale = \"en-GB\"
story_points = \"points.csv\"

[[category]]
category = \"health\"
file = \"health.csv\"

[[category]]
category = \"us\"
file = \"us.csv\"
";

const HEALTH: &str = "\
date,word,count
01/06/2020,mask,3
02/06/2020,mask,4
02/06/2020,vaccine,1
03/06/2020,mask,1
03/06/2020,vaccine,oops
";

const US: &str = "\
date,word,count
02/06/2020,vote,6
02/06/2020,mask,2
";

const POINTS: &str = "\
clip,category,word,start,end,description
clip1,health,mask,02/06/2020,03/06/2020,Masks recommended
";

fn dataset() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("dataset.toml"), MANIFEST).unwrap();
    std::fs::write(dir.path().join("health.csv"), HEALTH).unwrap();
    std::fs::write(dir.path().join("us.csv"), US).unwrap();
    std::fs::write(dir.path().join("points.csv"), POINTS).unwrap();
    dir
}

fn wt_cmd(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("wt").unwrap();
    cmd.env_remove("WT_DATASET");
    cmd.arg("--dataset").arg(dir.path().join("dataset.toml"));
    cmd
}

#[test]
fn stats_reports_span_and_categories() {
    let dir = dataset();
    wt_cmd(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("(3 days)"))
        .stdout(predicate::str::contains("Day 1: 01 June 2020"))
        .stdout(predicate::str::contains("rejected:   1"))
        .stdout(predicate::str::contains("stories:    1"))
        .stdout(predicate::str::contains("Health"))
        .stdout(predicate::str::contains("US Politics"));
}

#[test]
fn stats_json() {
    let dir = dataset();
    let output = wt_cmd(&dir).args(["stats", "--json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["calendar"]["total_days"], 3);
    assert_eq!(json["categories"].as_array().unwrap().len(), 2);
    let health = json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["category"] == "health")
        .unwrap();
    assert_eq!(health["max_total_word_count"], 5);
    assert_eq!(health["words"], 2);
}

#[test]
fn dataset_from_env() {
    let dir = dataset();
    #[allow(deprecated)]
    Command::cargo_bin("wt")
        .unwrap()
        .env("WT_DATASET", dir.path().join("dataset.toml"))
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("(3 days)"));
}

#[test]
fn missing_dataset_is_an_error() {
    #[allow(deprecated)]
    Command::cargo_bin("wt")
        .unwrap()
        .env_remove("WT_DATASET")
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WT_DATASET"));
}

#[test]
fn words_of_category() {
    let dir = dataset();
    wt_cmd(&dir)
        .args(["words", "us"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mask"))
        .stdout(predicate::str::contains("vote"));
}

#[test]
fn word_details() {
    let dir = dataset();
    wt_cmd(&dir)
        .args(["word", "health", "MASK"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_count:  4"))
        .stdout(predicate::str::contains("max_delta:  3"))
        .stdout(predicate::str::contains("US Politics, Health"))
        .stdout(predicate::str::contains("2020-06-02  4"));
}

#[test]
fn unknown_word_fails() {
    let dir = dataset();
    wt_cmd(&dir)
        .args(["word", "us", "vaccine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in category"));
}

#[test]
fn unknown_category_fails() {
    let dir = dataset();
    wt_cmd(&dir)
        .args(["words", "sports"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
}

#[test]
fn play_reaches_end_and_reverses() {
    let dir = dataset();
    wt_cmd(&dir)
        .args(["play", "--frames", "10", "--dt", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Day 2: 02 June 2020"))
        .stdout(predicate::str::contains("story starts: [health] mask"))
        .stdout(predicate::str::contains("end of timeline: last day reached"))
        .stdout(predicate::str::contains("final: Day 3: 03 June 2020 paused=true"));
}

#[test]
fn play_json_lines() {
    let dir = dataset();
    let output = wt_cmd(&dir)
        .args(["play", "--json", "--frames", "1", "--dt", "0.5", "--speed", "up"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines[0]["event"], "date_changed");
    assert!(lines.iter().any(|l| l["event"] == "speed_changed" && l["effective_speed"] == 2.0));
    let last = lines.last().unwrap();
    assert_eq!(last["event"], "final");
    assert_eq!(last["frames"], 1);
    assert_eq!(last["day"], 2);
    assert_eq!(last["speed"], "fast_forward");
}
