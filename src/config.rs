//! Client configuration.
//!
//! Loaded from `~/.elove/config.toml`. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    DEFAULT_BASE_URL, DEFAULT_SURFACE_WIDTH, DRAG_THRESHOLD_RATIO, MAX_PHOTOS, REQUEST_TIMEOUT_MS,
    UPLOAD_TIMEOUT_MS,
};

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Backend API root, e.g. `http://192.168.2.100:5000/api`
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub upload_timeout_ms: u64,
    pub max_photos: usize,
    pub swipe_threshold_ratio: f64,
    /// Width of the card surface the drag threshold is measured against
    pub surface_width: f64,
    /// Where the identity token is stored; defaults to `~/.elove/identity.json`
    pub identity_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            upload_timeout_ms: UPLOAD_TIMEOUT_MS,
            max_photos: MAX_PHOTOS,
            swipe_threshold_ratio: DRAG_THRESHOLD_RATIO,
            surface_width: DEFAULT_SURFACE_WIDTH,
            identity_path: None,
        }
    }
}

impl ClientConfig {
    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit file; the file must exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The config file path: `~/.elove/config.toml`.
    pub fn path() -> Option<PathBuf> {
        Self::home().map(|h| h.join("config.toml"))
    }

    /// Identity file location, honoring `identity-path`
    pub fn identity_file(&self) -> Option<PathBuf> {
        self.identity_path
            .clone()
            .or_else(|| Self::home().map(|h| h.join("identity.json")))
    }

    fn home() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".elove"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base-url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(self.swipe_threshold_ratio > 0.0 && self.swipe_threshold_ratio < 1.0) {
            return Err(ConfigError::Invalid {
                field: "swipe-threshold-ratio",
                reason: format!("must be within (0, 1), got {}", self.swipe_threshold_ratio),
            });
        }
        if self.surface_width <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "surface-width",
                reason: format!("must be positive, got {}", self.surface_width),
            });
        }
        if self.max_photos == 0 {
            return Err(ConfigError::Invalid {
                field: "max-photos",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
