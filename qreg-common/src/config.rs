//! Configuration loading and backend endpoint resolution
//!
//! All settings resolve with the same priority order:
//! 1. Explicit override (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable for the backend base URL
pub const ENV_API_BASE_URL: &str = "QREG_API_BASE_URL";
/// Environment variable for the HTTP request timeout (seconds)
pub const ENV_HTTP_TIMEOUT_SECS: &str = "QREG_HTTP_TIMEOUT_SECS";
/// Environment variable for the preview scratch directory
pub const ENV_PREVIEW_DIR: &str = "QREG_PREVIEW_DIR";

/// Compiled default backend base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
/// Compiled default HTTP request timeout (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// TOML configuration file schema (`~/.config/qreg/config.toml`)
///
/// All fields optional; missing files or fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Backend base URL, e.g. "http://localhost:8000"
    pub api_base_url: Option<String>,
    /// HTTP request timeout in seconds
    pub http_timeout_secs: Option<u64>,
    /// Directory for locally-stored image previews
    pub preview_dir: Option<String>,
}

/// Get the platform configuration file path (`<config dir>/qreg/config.toml`)
pub fn config_file_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("qreg").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load the TOML config file if present
///
/// A missing file is not an error; it resolves to the default (empty) config.
/// A malformed file is reported as a warning and also resolves to defaults,
/// so a bad config never prevents startup.
pub fn load_toml_config() -> TomlConfig {
    let path = match config_file_path() {
        Ok(p) => p,
        Err(_) => return TomlConfig::default(),
    };
    load_toml_config_from(&path)
}

/// Load a TOML config from an explicit path (missing/malformed → defaults)
pub fn load_toml_config_from(path: &Path) -> TomlConfig {
    if !path.exists() {
        return TomlConfig::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return TomlConfig::default();
        }
    };

    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Resolve the backend base URL
///
/// Priority: explicit override → `QREG_API_BASE_URL` → TOML `api_base_url`
/// → compiled default. Trailing slashes are stripped so callers can always
/// append `/api/...` paths.
pub fn resolve_api_base_url(override_url: Option<&str>) -> String {
    // Priority 1: explicit override
    if let Some(url) = override_url {
        return normalize_base_url(url);
    }

    // Priority 2: environment variable
    if let Ok(url) = std::env::var(ENV_API_BASE_URL) {
        if !url.trim().is_empty() {
            info!("Backend base URL loaded from environment variable");
            return normalize_base_url(&url);
        }
    }

    // Priority 3: TOML config file
    let config = load_toml_config();
    if let Some(url) = config.api_base_url {
        if !url.trim().is_empty() {
            info!("Backend base URL loaded from TOML config");
            return normalize_base_url(&url);
        }
    }

    // Priority 4: compiled default
    DEFAULT_API_BASE_URL.to_string()
}

/// Resolve the HTTP request timeout
///
/// Priority: `QREG_HTTP_TIMEOUT_SECS` → TOML `http_timeout_secs` → default.
pub fn resolve_http_timeout() -> Duration {
    if let Ok(raw) = std::env::var(ENV_HTTP_TIMEOUT_SECS) {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => return Duration::from_secs(secs),
            _ => warn!("Ignoring invalid {}={:?}", ENV_HTTP_TIMEOUT_SECS, raw),
        }
    }

    let config = load_toml_config();
    if let Some(secs) = config.http_timeout_secs {
        if secs > 0 {
            return Duration::from_secs(secs);
        }
    }

    Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
}

/// Resolve the preview scratch directory
///
/// Priority: explicit override → `QREG_PREVIEW_DIR` → TOML `preview_dir`
/// → `<cache dir>/qreg/previews` → `./qreg_previews` as a last resort.
pub fn resolve_preview_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }

    if let Ok(dir) = std::env::var(ENV_PREVIEW_DIR) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    let config = load_toml_config();
    if let Some(dir) = config.preview_dir {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::cache_dir()
        .map(|d| d.join("qreg").join("previews"))
        .unwrap_or_else(|| PathBuf::from("./qreg_previews"))
}

/// Strip trailing slashes so `{base}/api/...` joins cleanly
fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
