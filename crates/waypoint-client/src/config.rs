//! Client connection settings.

use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;

/// Default global request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a Waypoint server.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server address, with or without scheme (e.g. `localhost:9702`).
    pub address: String,
    /// API token.
    pub token: String,
    /// Global timeout for a single request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Settings for an address and token with the default timeout.
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that address and token are present.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidConfig("address is empty".to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(Error::InvalidConfig("token is empty".to_string()));
        }
        Ok(())
    }

    /// Base URL for API requests; `https://` is assumed when no scheme is
    /// given and a trailing slash is dropped.
    pub fn base_url(&self) -> String {
        let address = self.address.trim().trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("https://{address}")
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
