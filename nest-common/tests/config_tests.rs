//! Unit tests for setting resolution and TOML loading
//!
//! Tests cover:
//! - Priority order CLI > environment > TOML > default
//! - Unparseable environment values falling through
//! - Loading a config file from disk
//!
//! Tests that manipulate NEST_* environment variables are marked #[serial]
//! so they never race each other.

use nest_common::config::{load_config, resolve_setting, TomlConfig, DEFAULT_WEIGHTS_URL};
use serial_test::serial;
use std::env;
use std::io::Write;

const TEST_VAR: &str = "NEST_TEST_PORT";

#[test]
#[serial]
fn test_cli_beats_everything() {
    env::set_var(TEST_VAR, "7000");
    let port = resolve_setting(Some(8000u16), TEST_VAR, Some(9000), 5780);
    assert_eq!(port, 8000);
    env::remove_var(TEST_VAR);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(TEST_VAR, "7000");
    let port = resolve_setting(None, TEST_VAR, Some(9000u16), 5780);
    assert_eq!(port, 7000);
    env::remove_var(TEST_VAR);
}

#[test]
#[serial]
fn test_toml_beats_default() {
    env::remove_var(TEST_VAR);
    let port = resolve_setting(None, TEST_VAR, Some(9000u16), 5780);
    assert_eq!(port, 9000);
}

#[test]
#[serial]
fn test_default_when_nothing_set() {
    env::remove_var(TEST_VAR);
    let port = resolve_setting(None::<u16>, TEST_VAR, None, 5780);
    assert_eq!(port, 5780);
}

#[test]
#[serial]
fn test_unparseable_env_falls_through() {
    env::set_var(TEST_VAR, "not-a-port");
    let port = resolve_setting(None, TEST_VAR, Some(9000u16), 5780);
    assert_eq!(port, 9000);
    env::remove_var(TEST_VAR);
}

#[test]
#[serial]
fn test_string_settings_resolve_to_default_url() {
    env::remove_var("NEST_TEST_WEIGHTS_URL");
    let url = resolve_setting(
        None,
        "NEST_TEST_WEIGHTS_URL",
        None,
        DEFAULT_WEIGHTS_URL.to_string(),
    );
    assert!(url.starts_with("https://docs.google.com/spreadsheets/"));
    assert!(url.ends_with("format=csv"));
}

#[test]
fn test_load_config_from_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"weights_url = "/tmp/weights.csv"
port = 6100

[[users]]
username = "ops"
password = "ops-pass"
"#
    )
    .unwrap();

    let config = load_config(Some(file.path()), "nest-sim").unwrap();
    assert_eq!(config.weights_url.as_deref(), Some("/tmp/weights.csv"));
    assert_eq!(config.port, Some(6100));
    assert_eq!(config.bind, None);
    assert_eq!(config.users.len(), 1);
    assert_eq!(config.logging, TomlConfig::default().logging);
}
