//! Unit tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Missing TOML files resolve to defaults without error
//! - Malformed TOML resolves to defaults (warning, no termination)
//! - Priority order: override → environment → TOML → compiled default
//!
//! Note: Uses serial_test to prevent ENV variable race conditions. Tests
//! that manipulate QREG_* variables are marked with #[serial] so they run
//! sequentially, not in parallel.

use qreg_common::config::{
    load_toml_config_from, resolve_api_base_url, resolve_http_timeout, resolve_preview_dir,
    TomlConfig, DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, ENV_API_BASE_URL,
    ENV_HTTP_TIMEOUT_SECS, ENV_PREVIEW_DIR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn test_missing_toml_file_resolves_to_defaults() {
    let config = load_toml_config_from(Path::new("/nonexistent/qreg/config.toml"));
    assert!(config.api_base_url.is_none());
    assert!(config.http_timeout_secs.is_none());
    assert!(config.preview_dir.is_none());
}

#[test]
fn test_malformed_toml_resolves_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_base_url = [this is not valid toml").unwrap();

    let config = load_toml_config_from(&path);
    assert!(config.api_base_url.is_none());
}

#[test]
fn test_toml_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let written = TomlConfig {
        api_base_url: Some("http://backend:9000".to_string()),
        http_timeout_secs: Some(10),
        preview_dir: Some("/tmp/previews".to_string()),
    };
    std::fs::write(&path, toml::to_string(&written).unwrap()).unwrap();

    let read = load_toml_config_from(&path);
    assert_eq!(read.api_base_url.as_deref(), Some("http://backend:9000"));
    assert_eq!(read.http_timeout_secs, Some(10));
    assert_eq!(read.preview_dir.as_deref(), Some("/tmp/previews"));
}

#[test]
#[serial]
fn test_base_url_default_when_nothing_configured() {
    env::remove_var(ENV_API_BASE_URL);

    let url = resolve_api_base_url(None);
    assert_eq!(url, DEFAULT_API_BASE_URL);
}

#[test]
#[serial]
fn test_base_url_env_beats_default() {
    env::set_var(ENV_API_BASE_URL, "http://env-host:7000/");

    let url = resolve_api_base_url(None);
    assert_eq!(url, "http://env-host:7000");

    env::remove_var(ENV_API_BASE_URL);
}

#[test]
#[serial]
fn test_base_url_override_beats_env() {
    env::set_var(ENV_API_BASE_URL, "http://env-host:7000");

    let url = resolve_api_base_url(Some("http://override:8080"));
    assert_eq!(url, "http://override:8080");

    env::remove_var(ENV_API_BASE_URL);
}

#[test]
#[serial]
fn test_timeout_default_and_env() {
    env::remove_var(ENV_HTTP_TIMEOUT_SECS);
    assert_eq!(
        resolve_http_timeout(),
        Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
    );

    env::set_var(ENV_HTTP_TIMEOUT_SECS, "5");
    assert_eq!(resolve_http_timeout(), Duration::from_secs(5));

    // Invalid values are ignored, not fatal
    env::set_var(ENV_HTTP_TIMEOUT_SECS, "zero");
    assert_eq!(
        resolve_http_timeout(),
        Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
    );

    env::remove_var(ENV_HTTP_TIMEOUT_SECS);
}

#[test]
#[serial]
fn test_preview_dir_priority() {
    env::remove_var(ENV_PREVIEW_DIR);

    // Override wins over everything
    let override_dir = PathBuf::from("/tmp/qreg-previews-override");
    assert_eq!(resolve_preview_dir(Some(&override_dir)), override_dir);

    // Environment beats the compiled fallback
    env::set_var(ENV_PREVIEW_DIR, "/tmp/qreg-previews-env");
    assert_eq!(
        resolve_preview_dir(None),
        PathBuf::from("/tmp/qreg-previews-env")
    );
    env::remove_var(ENV_PREVIEW_DIR);

    // Fallback is always non-empty
    let fallback = resolve_preview_dir(None);
    assert!(!fallback.as_os_str().is_empty());
}
