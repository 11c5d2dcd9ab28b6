//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive together as [`ConfigOverrides`], since the binaries
//! read both through clap's `env` support.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Which transposition field the service accepts
///
/// A deployment runs in exactly one mode; the two request styles are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransposeMode {
    /// Form field `semitones` carries an explicit offset
    #[default]
    Semitones,
    /// Form field `targetKey` names the key to transpose into
    TargetKey,
}

impl TransposeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransposeMode::Semitones => "semitones",
            TransposeMode::TargetKey => "target_key",
        }
    }
}

impl fmt::Display for TransposeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransposeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "semitones" => Ok(TransposeMode::Semitones),
            "target_key" | "target-key" | "targetkey" => Ok(TransposeMode::TargetKey),
            other => Err(Error::Config(format!(
                "Unknown transpose mode '{}' (expected 'semitones' or 'target_key')",
                other
            ))),
        }
    }
}

/// Configuration file contents
///
/// Every field is optional; missing fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub uploads_dir: Option<PathBuf>,
    #[serde(default)]
    pub mode: Option<TransposeMode>,
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values from command line or environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub uploads_dir: Option<PathBuf>,
    pub mode: Option<TransposeMode>,
    pub ffmpeg_path: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub mode: TransposeMode,
    pub ffmpeg_path: PathBuf,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::resolve(&ConfigOverrides::default(), &TomlConfig::default())
    }
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: &ConfigOverrides, toml: &TomlConfig) -> Self {
        Self {
            host: overrides
                .host
                .clone()
                .or_else(|| toml.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            uploads_dir: overrides
                .uploads_dir
                .clone()
                .or_else(|| toml.uploads_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR)),
            mode: overrides.mode.or(toml.mode).unwrap_or_default(),
            ffmpeg_path: overrides
                .ffmpeg_path
                .clone()
                .or_else(|| toml.ffmpeg_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG)),
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            log_level: toml.logging.level.clone(),
        }
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the default configuration file
///
/// Tries `~/.config/keyshift/config.toml`, then `/etc/keyshift/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("keyshift").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/keyshift/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Load the TOML configuration
///
/// An explicit `path` must exist. Without one, the default locations are tried
/// and a missing file yields defaults with a warning. Malformed TOML is always
/// an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                warn!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}
