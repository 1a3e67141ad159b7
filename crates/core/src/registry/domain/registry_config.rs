use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::domain::matcher::{MatchPolicy, Matcher};
use crate::registry::domain::registry_error::ConfigError;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MATCH_THRESHOLD, DEFAULT_STORAGE_FILE,
};

/// Tunables for an identity registry.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum descriptor distance for a match; lower is stricter.
    pub threshold: f64,
    pub storage_path: PathBuf,
    pub match_policy: MatchPolicy,
    /// Descriptor length to enforce before the first identity is stored.
    pub dimension: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            match_policy: MatchPolicy::First,
            dimension: None,
        }
    }
}

impl RegistryConfig {
    /// Platform config location, e.g. `~/.config/FaceKeeper/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at [`default_path`](Self::default_path) if it exists,
    /// otherwise returns the defaults. A file that exists but is invalid is
    /// still an error.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.dimension == Some(0) {
            return Err(ConfigError::InvalidDimension);
        }
        Ok(())
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.threshold, self.match_policy)
    }
}
