//! End-to-end tests for the `chunklog` binary
//!
//! Every test runs against its own storage root and config directory so the
//! user's global config never leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("chunklog").unwrap();
        cmd.env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("CHUNKLOG_ROOT", self.dir.path().join("store"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).assert().success().get_output().stdout.clone();
        String::from_utf8(output).unwrap()
    }

    /// Ingest `text` as a completed log and return its id
    fn ingest(&self, text: &str, extra: &[&str]) -> String {
        let path = self.dir.path().join("input.log");
        fs::write(&path, text).unwrap();
        let mut args = vec!["--block-size", "32", "ingest", path.to_str().unwrap()];
        args.extend_from_slice(extra);
        self.stdout(&args).trim().to_string()
    }
}

const BUILD_LOG: &str = "\
Compiling chunklog-core v0.1.0
Compiling chunklog-cli v0.1.0
warning: unused variable `x`
error[E0308]: mismatched types
Finished dev profile
";

#[test]
fn test_new_prints_log_id() {
    let env = Env::new();
    let id = env.stdout(&["new"]);
    assert_eq!(id.trim().len(), 36);

    env.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.trim()))
        .stdout(predicate::str::contains("open"));
}

#[test]
fn test_ingest_then_cat_round_trips() {
    let env = Env::new();
    let id = env.ingest(BUILD_LOG, &[]);

    env.cmd()
        .args(["cat", &id])
        .assert()
        .success()
        .stdout(BUILD_LOG);
}

#[test]
fn test_search_reports_matching_lines() {
    let env = Env::new();
    let id = env.ingest(BUILD_LOG, &[]);

    env.cmd()
        .args(["search", &id, "COMPILING"])
        .assert()
        .success()
        .stdout("0\n1\n");

    env.cmd()
        .args(["search", &id, "mismatched", "--show-lines"])
        .assert()
        .success()
        .stdout(predicate::str::contains("error[E0308]: mismatched types"));
}

#[test]
fn test_search_json_includes_stats() {
    let env = Env::new();
    let id = env.ingest(BUILD_LOG, &[]);

    let output = env.stdout(&["--format", "json", "search", &id, "warning", "--stats"]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["matches"][0]["line"], 2);
    assert!(value["stats"]["num_scanned_blocks"].as_u64().unwrap() >= 1);
    assert!(value["stats"]["num_skipped_blocks"].is_u64());
}

#[test]
fn test_search_respects_max_results() {
    let env = Env::new();
    let id = env.ingest(BUILD_LOG, &[]);

    env.cmd()
        .args(["search", &id, "chunklog", "-n", "1"])
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_append_and_complete() {
    let env = Env::new();
    let id = env.ingest("first\n", &["--keep-open"]);

    env.cmd().args(["append", &id, "second"]).assert().success();
    env.cmd()
        .args(["append", &id, "tail", "--raw"])
        .assert()
        .success();
    env.cmd()
        .args(["complete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 lines"));

    env.cmd()
        .args(["lines", &id, "1", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1: second"))
        .stdout(predicate::str::contains("2: tail"));
}

#[test]
fn test_unterminated_text_kept_between_invocations() {
    let env = Env::new();
    let id = env.ingest("head\npartial", &["--keep-open"]);

    env.cmd()
        .args(["append", &id, " line", "--raw"])
        .assert()
        .success();
    env.cmd().args(["append", &id, "!"]).assert().success();

    env.cmd()
        .args(["cat", &id])
        .assert()
        .success()
        .stdout("head\npartial line!\n");
    env.cmd()
        .args(["search", &id, "PARTIAL LINE"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_append_to_complete_log_fails() {
    let env = Env::new();
    let id = env.ingest(BUILD_LOG, &[]);

    env.cmd()
        .args(["append", &id, "more"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("complete"));
}

#[test]
fn test_info_json_shape() {
    let env = Env::new();
    let id = env.ingest(BUILD_LOG, &[]);

    let output = env.stdout(&["-f", "json", "info", &id]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["index"]["line_count"], 5);
    assert_eq!(value["index"]["length"], BUILD_LOG.len());
    assert_eq!(value["index"]["complete"], true);
    assert!(value["index"]["blocks"].as_u64().unwrap() > 1);
    assert_eq!(value["log"]["log_type"], "text");
}

#[test]
fn test_unknown_log_fails() {
    let env = Env::new();
    env.cmd()
        .args(["cat", "00000000000000000000000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_malformed_log_id_fails() {
    let env = Env::new();
    env.cmd()
        .args(["search", "not-an-id", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a log id"));
}

#[test]
fn test_config_init_and_show() {
    let env = Env::new();
    let config_path = env.dir.path().join("chunklog.toml");

    env.cmd()
        .args(["config", "init", "--path", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file at"));
    assert!(fs::read_to_string(&config_path).unwrap().contains("[index]"));

    env.cmd()
        .args(["config", "init", "--path", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    fs::write(&config_path, "[index]\nblock_size = 128\n").unwrap();
    env.cmd()
        .args(["-C", config_path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("block_size = 128"));
}

#[test]
fn test_zero_block_size_rejected() {
    let env = Env::new();
    env.cmd()
        .args(["--block-size", "0", "new"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("block_size"));
}
