//! Configuration loading tests

use parley_common::config::{database_path, resolve_data_dir, ServiceConfig};
use serial_test::serial;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn defaults_when_no_file() {
    let config = ServiceConfig::load(Some(Path::new("/nonexistent/config.toml")));
    assert!(config.is_err(), "missing explicit file is an error");

    let config = ServiceConfig::default();
    assert_eq!(config.token_session_minutes, 60);
    assert_eq!(config.booking_session_minutes, 120);
    assert_eq!(config.token_validity_minutes, 240);
}

#[test]
fn loads_coordinator_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/tmp/parley-test"

        [coordinator]
        bind_addr = "0.0.0.0:9000"
        token_session_minutes = 45
        "#,
    )
    .unwrap();

    let config = ServiceConfig::load(Some(&path)).unwrap();
    assert_eq!(config.bind_addr, "0.0.0.0:9000");
    assert_eq!(config.token_session_minutes, 45);
    // Unset keys fall back to defaults
    assert_eq!(config.booking_session_minutes, 120);
}

#[test]
fn partial_file_without_coordinator_table_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "root_folder = \"/tmp/x\"\n").unwrap();

    let config = ServiceConfig::load(Some(&path)).unwrap();
    assert_eq!(config.bind_addr, ServiceConfig::default().bind_addr);
}

#[test]
#[serial]
fn cli_argument_wins_over_environment() {
    std::env::set_var("PARLEY_DATA", "/tmp/from-env");
    let dir = resolve_data_dir(Some("/tmp/from-cli"));
    assert_eq!(dir, Path::new("/tmp/from-cli"));
    std::env::remove_var("PARLEY_DATA");
}

#[test]
#[serial]
fn environment_variable_is_used_when_no_cli() {
    std::env::set_var("PARLEY_DATA", "/tmp/from-env");
    let dir = resolve_data_dir(None);
    assert_eq!(dir, Path::new("/tmp/from-env"));
    std::env::remove_var("PARLEY_DATA");
}

#[test]
fn database_path_is_inside_data_dir() {
    let path = database_path(Path::new("/tmp/parley"));
    assert_eq!(path, Path::new("/tmp/parley/parley.db"));
}
