//! Configuration file
//!
//! Stored as TOML under the user config directory. Every field has a
//! default, so an empty or missing file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use divo_device::SessionOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings handed to transport collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Bluetooth address of the display
    pub address: Option<String>,
    /// Read timeout of the link in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: None,
            read_timeout_ms: 2000,
        }
    }
}

impl DeviceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Refuse to send malformed frames
    pub validate_outgoing: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            validate_outgoing: true,
        }
    }
}

/// Default `tracing` filter directive
pub const DEFAULT_LOG_FILTER: &str = "divo=info,divo_transport=info,divo_device=info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Raise the default level to debug
    pub debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DivoConfig {
    pub device: DeviceConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl DivoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("divo")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from the default path; a broken file is logged and ignored
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        Self::load(&path).unwrap_or_else(|e| {
            warn!("ignoring config {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            validate_outgoing: self.session.validate_outgoing,
        }
    }
}
