//! Engine configuration

use crate::matching::{MatchPolicy, PolicyError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid match policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("search_limit must be at least 1")]
    EmptySearchLimit,
}

/// Engine configuration.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scoring constants for the match ranking engine
    pub matching: MatchPolicy,

    /// Maximum number of discovery search results returned
    pub search_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            matching: MatchPolicy::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matching.validate()?;
        if self.search_limit == 0 {
            return Err(ConfigError::EmptySearchLimit);
        }
        Ok(())
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}
