//! Container build options.
//!
//! Options can be set in code or loaded from a TOML document:
//!
//! ```toml
//! validate_on_build = true
//! validate_scopes = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Checks performed by the container, all disabled by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceProviderOptions {
    /// Construct every registered service once when the container is built, and report all
    /// failures together.
    pub validate_on_build: bool,
    /// Refuse to resolve scoped services from the root container.
    pub validate_scopes: bool,
}

impl ServiceProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_on_build(mut self, enabled: bool) -> Self {
        self.validate_on_build = enabled;
        self
    }

    pub fn validate_scopes(mut self, enabled: bool) -> Self {
        self.validate_scopes = enabled;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// Errors triggered while loading options
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read the options file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid options: {0}")]
    Parse(#[from] toml::de::Error),
}
