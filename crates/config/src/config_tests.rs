use crate::{CommandSpec, ConfigLoader, RunnerConfig};
use conformer_core::{
    Error, CONFORMER_CACHE_DIR_VAR, CONFORMER_COMPRESSION_VAR, CONFORMER_TEST_ROOT_VAR,
    CONFORMER_TIMEOUT_VAR,
};
use serial_test::serial;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn clear_env() {
    for var in [
        CONFORMER_TEST_ROOT_VAR,
        CONFORMER_CACHE_DIR_VAR,
        CONFORMER_TIMEOUT_VAR,
        CONFORMER_COMPRESSION_VAR,
    ] {
        std::env::remove_var(var);
    }
}

#[test]
fn test_defaults() {
    let config = RunnerConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert!(config.compression);
    assert_eq!(config.cache_dir, PathBuf::from("."));
    assert!(config.agent.is_none());
}

#[test]
fn test_resolve_test_path() {
    let config = RunnerConfig::builder().test_root("/suite").build();
    assert_eq!(
        config.resolve_test_path(Path::new("built-ins/a.js")),
        PathBuf::from("/suite/built-ins/a.js")
    );
    assert_eq!(
        config.resolve_test_path(Path::new("/elsewhere/b.js")),
        PathBuf::from("/elsewhere/b.js")
    );
}

#[test]
#[serial]
fn test_file_then_env_layering() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conformer.json");
    std::fs::write(
        &path,
        r#"{
            "testRoot": "/suite",
            "cacheDir": "/var/cache/conformer",
            "timeoutMs": 1500,
            "agent": { "program": "node", "args": ["--stack-size=2000"] }
        }"#,
    )
    .unwrap();

    std::env::set_var(CONFORMER_TIMEOUT_VAR, "250");
    let config = ConfigLoader::new().file(&path).load().unwrap();
    clear_env();

    assert_eq!(config.test_root, PathBuf::from("/suite"));
    assert_eq!(config.cache_dir, PathBuf::from("/var/cache/conformer"));
    assert_eq!(config.timeout, Duration::from_millis(250));
    assert!(config.compression);
    assert_eq!(
        config.agent,
        Some(CommandSpec::new("node").arg("--stack-size=2000"))
    );
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var(CONFORMER_TEST_ROOT_VAR, "/t262");
    std::env::set_var(CONFORMER_COMPRESSION_VAR, "off");
    let config = RunnerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.test_root, PathBuf::from("/t262"));
    assert!(!config.compression);
}

#[test]
#[serial]
fn test_invalid_timeout_is_rejected() {
    clear_env();
    std::env::set_var(CONFORMER_TIMEOUT_VAR, "soon");
    let result = RunnerConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(Error::Configuration { .. })));
}

#[test]
#[serial]
fn test_without_env_ignores_variables() {
    clear_env();
    std::env::set_var(CONFORMER_TEST_ROOT_VAR, "/ignored");
    let config = ConfigLoader::new().without_env().load().unwrap();
    clear_env();

    assert_eq!(config.test_root, PathBuf::from("."));
}

#[test]
fn test_malformed_file_reports_json_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = ConfigLoader::new().without_env().file(&path).load();
    assert!(matches!(result, Err(Error::Json { .. })));
}

#[test]
fn test_round_trip_uses_wire_names() {
    let config = RunnerConfig::builder()
        .timeout(Duration::from_millis(10))
        .transpiler(CommandSpec::new("babel-wrapper"))
        .build();
    let value = serde_json::to_value(&config).unwrap();
    assert_eq!(value["timeoutMs"], 10);
    assert_eq!(value["transpiler"]["program"], "babel-wrapper");
    assert!(value.get("agent").is_none());
}
