//! Reactive core configuration (lazy.toml)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration for the observable system
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RxConfig {
    #[serde(default)]
    pub variables: VariableConfig,
    #[serde(default)]
    pub unhandled: UnhandledConfig,
}

/// Defaults applied to reactive variables
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct VariableConfig {
    /// Replay the current value to new subscribers
    #[serde(default = "default_true")]
    pub subscribe_with_init: bool,
}

fn default_true() -> bool {
    true
}

impl Default for VariableConfig {
    fn default() -> Self {
        Self {
            subscribe_with_init: true,
        }
    }
}

/// Default unhandled-error handler settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct UnhandledConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Level used when logging unhandled errors
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

impl RxConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
