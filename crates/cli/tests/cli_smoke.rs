//! End-to-end checks of the conformer binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn conformer() -> Command {
    let mut cmd = Command::cargo_bin("conformer").unwrap();
    cmd.env("CONFORMER_LOG", "error")
        .env_remove("CONFORMER_TEST_ROOT")
        .env_remove("CONFORMER_CACHE_DIR")
        .env_remove("CONFORMER_TIMEOUT_MS")
        .env_remove("CONFORMER_COMPRESSION");
    cmd
}

#[test]
fn test_help_lists_commands() {
    conformer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("cache"));
}

#[test]
fn test_run_requires_files() {
    conformer().arg("run").assert().failure();
}

#[test]
fn test_run_without_agent_fails() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.js"), "var x = 1;").unwrap();

    conformer()
        .arg("run")
        .arg("--test-root")
        .arg(root.path())
        .arg("--cache-dir")
        .arg(root.path().join("cache"))
        .arg("a.js")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no execution agent command configured"));
}

#[test]
fn test_cache_stats_on_empty_store() {
    let cache = TempDir::new().unwrap();

    conformer()
        .args(["cache", "stats", "--cache-dir"])
        .arg(cache.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"live_entries\": 0"));
}

#[cfg(unix)]
#[test]
fn test_run_prints_outcomes_and_fills_cache() {
    let root = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.js"), "var x = 1;").unwrap();

    for _ in 0..2 {
        let output = conformer()
            .arg("run")
            .arg("--test-root")
            .arg(root.path())
            .arg("--cache-dir")
            .arg(cache.path())
            .args(["--agent", "cat", "a.js"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let line: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(
            line,
            serde_json::json!({"file": "a.js", "result": "success", "output": "var x = 1;"})
        );
    }

    conformer()
        .args(["cache", "stats", "--cache-dir"])
        .arg(cache.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"live_entries\": 1"));

    conformer()
        .args(["cache", "clear", "--cache-dir"])
        .arg(cache.path())
        .assert()
        .success();

    conformer()
        .args(["cache", "stats", "--cache-dir"])
        .arg(cache.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"live_entries\": 0"));
}

#[cfg(unix)]
#[test]
fn test_second_run_is_served_from_cache() {
    let root = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let counter = root.path().join("evaluations.log");
    std::fs::write(root.path().join("a.js"), "var x = 1;").unwrap();

    for _ in 0..2 {
        let output = conformer()
            .arg("run")
            .arg("--test-root")
            .arg(root.path())
            .arg("--cache-dir")
            .arg(cache.path())
            .args(["--agent", "sh", "--agent-arg", "-c", "--agent-arg"])
            .arg(r#"echo run >> "$COUNTER_FILE"; cat "$0""#)
            .arg("a.js")
            .env("COUNTER_FILE", &counter)
            .output()
            .unwrap();
        assert!(output.status.success());

        let line: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(line["result"], "success");
        assert_eq!(line["output"], "var x = 1;");
    }

    let evaluations = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(evaluations.lines().count(), 1);
}
