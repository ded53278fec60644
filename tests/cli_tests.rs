//! CLI integration tests using assert_cmd.
//!
//! Tests without database: always run (help, arg validation).
//! Tests with database: gated on TEST_DATABASE_URL environment variable.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn reviewdesk() -> Command {
    let mut cmd = Command::cargo_bin("reviewdesk").unwrap();
    cmd.env_remove("DATABASE_URL");
    cmd
}

// --- Help and arg validation (no database needed) ---

#[test]
fn help_shows_all_subcommands() {
    reviewdesk().arg("--help").assert().success().stdout(
        predicate::str::contains("serve")
            .and(predicate::str::contains("start"))
            .and(predicate::str::contains("score"))
            .and(predicate::str::contains("submit"))
            .and(predicate::str::contains("list"))
            .and(predicate::str::contains("show")),
    );
}

#[test]
fn help_shows_global_options() {
    reviewdesk().arg("--help").assert().success().stdout(
        predicate::str::contains("--database-url")
            .and(predicate::str::contains("--agent-dir"))
            .and(predicate::str::contains("--ingest-concurrency"))
            .and(predicate::str::contains("--analysis-timeout-secs")),
    );
}

#[test]
fn help_score_shows_args() {
    reviewdesk().args(["score", "--help"]).assert().success().stdout(
        predicate::str::contains("--project-id")
            .and(predicate::str::contains("--score"))
            .and(predicate::str::contains("--scored-by")),
    );
}

#[test]
fn score_requires_project_id() {
    reviewdesk()
        .args(["score", "--score", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--project-id"));
}

#[test]
fn score_rejects_malformed_uuid() {
    reviewdesk()
        .args(["score", "--project-id", "not-a-uuid", "--score", "50"])
        .assert()
        .failure();
}

#[test]
fn show_without_database_url_fails() {
    reviewdesk()
        .args(["show", "00000000-0000-0000-0000-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL is required"));
}

#[test]
fn start_with_missing_file_fails() {
    reviewdesk()
        .args(["start", "--title", "Batch", "--file", "/nonexistent/batch.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn unknown_subcommand_fails() {
    reviewdesk().arg("frobnicate").assert().failure();
}

// --- With database ---

#[test]
fn list_on_empty_database() {
    if !common::has_test_db() {
        eprintln!("Skipping: TEST_DATABASE_URL not set");
        return;
    }
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(common::setup_test_db());
    reviewdesk()
        .env("DATABASE_URL", common::test_db_url())
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("No reviews found"));
}
