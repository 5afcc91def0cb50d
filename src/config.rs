//! Client settings resolution
//!
//! Host and token come from three places, highest precedence first:
//! the `WAYPOINT_HOST` / `WAYPOINT_TOKEN` environment variables, the
//! provider configuration block, and an optional settings file at
//! `<config dir>/terraform-provider-waypoint/settings.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use waypoint_client::{ClientConfig, DEFAULT_TIMEOUT};

/// Environment variable holding the server address
pub const HOST_ENV: &str = "WAYPOINT_HOST";

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "WAYPOINT_TOKEN";

const APP_DIR: &str = "terraform-provider-waypoint";
const SETTINGS_FILE: &str = "settings.toml";

/// Get the settings file path
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
}

/// One source of client settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub host: Option<String>,
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
}

impl Settings {
    /// Load the settings file, or empty settings when there is none
    pub fn load() -> Result<Self> {
        match settings_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Settings from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Settings from an environment lookup; empty variables count as unset
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            host: var(HOST_ENV),
            token: var(TOKEN_ENV),
            timeout_seconds: None,
        }
    }

    /// Fill unset (or empty) values from a lower-precedence source
    pub fn or(self, lower: Settings) -> Settings {
        Settings {
            host: non_empty(self.host).or(non_empty(lower.host)),
            token: non_empty(self.token).or(non_empty(lower.token)),
            timeout_seconds: self.timeout_seconds.or(lower.timeout_seconds),
        }
    }

    /// Request timeout, falling back to the client default
    pub fn timeout(&self) -> Duration {
        self.timeout_seconds
            .filter(|s| *s > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }

    /// Client configuration, when both host and token are present
    pub fn client_config(&self) -> Option<ClientConfig> {
        let host = self.host.as_deref().filter(|h| !h.is_empty())?;
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        Some(ClientConfig::new(host, token).timeout(self.timeout()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
