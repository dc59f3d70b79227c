#![allow(missing_docs)]

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

#[test]
fn help() {
    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("-h <HEIGHT>")
                .and(predicate::str::contains("-l <WIDTH>"))
                .and(predicate::str::contains("-m <MAXIMUM>"))
                .and(predicate::str::contains("--strict")),
        );
}

#[test]
fn depth_first_run_writes_the_terminal_stage() {
    let directory = TempDir::new().unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["generate", "-h", "1", "-l", "2", "-m", "3"])
        .arg(directory.path())
        .assert()
        .success();

    let log = directory.path().join("h01l02m03.log");
    assert!(log.is_file());

    // the two orderings of the single two-cell region holding {1, 2}
    Command::cargo_bin("tectonic")
        .unwrap()
        .arg("read")
        .arg(&log)
        .arg("--codes")
        .assert()
        .success()
        .stdout("227650241025\n197585469953\n");
}

#[test]
fn single_stage_run_writes_one_frontier() {
    let directory = TempDir::new().unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["generate", "-h", "1", "-l", "2", "-m", "3", "-q"])
        .arg(directory.path())
        .assert()
        .success();

    let frontier = directory.path().join("h01l02m03-p01.log");
    assert!(frontier.is_file());
    assert!(!directory.path().join("h01l02m03.log").exists());

    // one partial grid per value of the first cell
    let output = Command::cargo_bin("tectonic")
        .unwrap()
        .arg("read")
        .arg(&frontier)
        .arg("--codes")
        .assert()
        .success();
    let lines = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert_eq!(lines.lines().count(), 3);
}

#[test]
fn staged_runs_can_be_chained() {
    let directory = TempDir::new().unwrap();

    for _ in 0..2 {
        Command::cargo_bin("tectonic")
            .unwrap()
            .args(["generate", "-h", "1", "-l", "2", "-m", "3", "-q"])
            .arg(directory.path())
            .assert()
            .success();
    }

    // the second run restarted from the first frontier
    assert!(directory.path().join("h01l02m03-p01.log").is_file());
    assert!(directory.path().join("h01l02m03.log").is_file());
}

#[test]
fn invalid_base_is_rejected() {
    let directory = TempDir::new().unwrap();

    Command::cargo_bin("tectonic")
        .unwrap()
        .args(["generate", "-h", "0", "-l", "2", "-m", "3"])
        .arg(directory.path())
        .assert()
        .failure();
}
