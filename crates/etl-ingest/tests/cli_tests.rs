//! Tests for the `etl` binary: flag handling and exit codes

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn etl() -> Command {
    let mut cmd = Command::cargo_bin("etl").unwrap();
    // Keep a developer's .env and LOG_* settings out of the tests
    cmd.env_remove("LOG_OUTPUT")
        .env_remove("LOG_LEVEL")
        .env_remove("ETL_SOURCE_DIR")
        .env("ETL_ENV_FILE", "/dev/null");
    cmd
}

#[test]
fn test_pipeline_command() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("people.csv"), "Ayush,70,150\n").unwrap();
    let target = dir.path().join("out.csv");
    let log = dir.path().join("log.txt");

    etl()
        .arg("pipeline")
        .arg("--source-dir")
        .arg(dir.path())
        .arg("--target")
        .arg(&target)
        .arg("--log-file")
        .arg(&log)
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(&target).unwrap(),
        "name,height,weight\nAyush,1.78,68.04\n"
    );
    assert_eq!(std::fs::read_to_string(&log).unwrap().lines().count(), 8);
}

#[test]
fn test_pipeline_failure_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.csv"), "Ayush,seventy,150\n").unwrap();

    etl()
        .arg("pipeline")
        .arg("--source-dir")
        .arg(dir.path())
        .arg("--log-file")
        .arg(dir.path().join("log.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Extract").or(predicate::str::contains("Format error")));
}

#[test]
fn test_staff_command_prints_queries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("INSTRUCTOR.csv"), "1,Rav,Ahuja,TORONTO,CA\n").unwrap();

    etl()
        .arg("staff")
        .arg("--csv")
        .arg(dir.path().join("INSTRUCTOR.csv"))
        .arg("--db")
        .arg(dir.path().join("STAFF.db"))
        .arg("--log-file")
        .arg(dir.path().join("staff_log.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("SELECT FNAME FROM INSTRUCTOR"))
        .stdout(predicate::str::contains("Rav"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    etl().arg("explode").assert().code(2);
}

#[test]
fn test_invalid_flag_value_is_usage_error() {
    etl().args(["banks", "--top", "ten"]).assert().code(2);
}
