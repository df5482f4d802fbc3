//! Configuration loading and setting resolution
//!
//! Every setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the service logs it and starts on
//! defaults. A TOML file that exists but does not parse is.

use crate::auth::UserCredential;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Published spreadsheet export holding the default weights table
pub const DEFAULT_WEIGHTS_URL: &str =
    "https://docs.google.com/spreadsheets/d/1CG19lrXCDYLeyPihaq4xwuPSw86oQUNB/export?format=csv";

/// Logging section of the TOML file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Contents of `<config_dir>/nest/<module>.toml`
///
/// All fields are optional; unset fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TomlConfig {
    /// Weights source location (http(s) URL, file:// URL or path)
    pub weights_url: Option<String>,
    /// Listen address
    pub bind: Option<String>,
    /// Listen port
    pub port: Option<u16>,
    pub logging: LoggingConfig,
    /// Login allow-list; empty means the compiled-in list
    pub users: Vec<UserCredential>,
}

/// Default config file location for a module
///
/// `~/.config/nest/<module>.toml` on Linux, the platform config dir elsewhere.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nest").join(format!("{}.toml", module_name)))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the module's TOML config
///
/// An explicitly requested file must exist. The default location may be
/// absent, in which case an all-default config is returned.
pub fn load_config(explicit_path: Option<&Path>, module_name: &str) -> Result<TomlConfig> {
    if let Some(path) = explicit_path {
        info!("Loading config from {}", path.display());
        return load_toml_config(path);
    }

    match default_config_path(module_name) {
        Some(path) if path.exists() => {
            info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve a setting: CLI > environment > TOML > default
///
/// An environment value that fails to parse is ignored with a warning.
pub fn resolve_setting<T>(
    cli_arg: Option<T>,
    env_var_name: &str,
    toml_value: Option<T>,
    default: T,
) -> T
where
    T: FromStr,
{
    if let Some(value) = cli_arg {
        return value;
    }

    if let Ok(raw) = std::env::var(env_var_name) {
        match raw.parse::<T>() {
            Ok(value) => return value,
            Err(_) => warn!("Ignoring unparseable {}={:?}", env_var_name, raw),
        }
    }

    toml_value.unwrap_or(default)
}
