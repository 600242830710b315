//! Channel configuration: passcode and command whitelist
//!
//! Stored as JSON, e.g.
//!
//! ```json
//! { "passcode": "tucar987", "accepted_commands": ["^lock\\s.*"] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Whitelist used when a config does not list its own
pub const DEFAULT_ACCEPTED_COMMANDS: &[&str] =
    &[r"^lock\s.*", r"^unlock\s.*", r"^module\s.*", r"^bt\s.*"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub passcode: String,
    #[serde(default = "default_accepted_commands")]
    pub accepted_commands: Vec<String>,
}

fn default_accepted_commands() -> Vec<String> {
    DEFAULT_ACCEPTED_COMMANDS.iter().map(|s| s.to_string()).collect()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            passcode: String::new(),
            accepted_commands: default_accepted_commands(),
        }
    }
}

impl ChannelConfig {
    pub fn new<I, S>(passcode: impl Into<String>, accepted_commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            passcode: passcode.into(),
            accepted_commands: accepted_commands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
