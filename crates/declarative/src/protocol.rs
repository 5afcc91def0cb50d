//! Line-delimited JSON plugin protocol
//!
//! The plugin prints one handshake line and then answers exactly one
//! response line for every request line it reads:
//!
//! ```text
//! PROVIDER_PLUGIN|1|stdio
//! > {"method":"get_provider_schema"}
//! < {"response":"schema","provider":{...},"resources":{...},...}
//! > {"method":"stop_provider"}
//! < {"response":"diagnostics","diagnostics":[]}
//! ```

use crate::diag::Diagnostics;
use crate::provider::Provider;
use crate::schema::Schema;
use crate::server::ProviderServer;
use crate::snapshot::Snapshot;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// First field of the handshake line
pub const HANDSHAKE_PREFIX: &str = "PROVIDER_PLUGIN";

/// Protocol version announced in the handshake
pub const PROTOCOL_VERSION: u32 = 1;

/// A request from the host engine
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    GetProviderSchema,
    ValidateProviderConfig {
        #[serde(default)]
        config: Snapshot,
    },
    ConfigureProvider {
        #[serde(default)]
        config: Snapshot,
    },
    ValidateResourceConfig {
        type_name: String,
        #[serde(default)]
        config: Snapshot,
    },
    PlanResourceChange {
        type_name: String,
        #[serde(default)]
        config: Snapshot,
        #[serde(default)]
        prior_state: Snapshot,
        #[serde(default)]
        proposed_new_state: Snapshot,
    },
    ApplyResourceChange {
        type_name: String,
        #[serde(default)]
        prior_state: Snapshot,
        #[serde(default)]
        planned_state: Snapshot,
    },
    ReadResource {
        type_name: String,
        #[serde(default)]
        current_state: Snapshot,
    },
    ValidateDataSourceConfig {
        type_name: String,
        #[serde(default)]
        config: Snapshot,
    },
    ReadDataSource {
        type_name: String,
        #[serde(default)]
        config: Snapshot,
    },
    StopProvider,
}

impl Request {
    /// Method name, for logging
    pub fn method(&self) -> &'static str {
        match self {
            Self::GetProviderSchema => "get_provider_schema",
            Self::ValidateProviderConfig { .. } => "validate_provider_config",
            Self::ConfigureProvider { .. } => "configure_provider",
            Self::ValidateResourceConfig { .. } => "validate_resource_config",
            Self::PlanResourceChange { .. } => "plan_resource_change",
            Self::ApplyResourceChange { .. } => "apply_resource_change",
            Self::ReadResource { .. } => "read_resource",
            Self::ValidateDataSourceConfig { .. } => "validate_data_source_config",
            Self::ReadDataSource { .. } => "read_data_source",
            Self::StopProvider => "stop_provider",
        }
    }
}

/// A response to the host engine
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    Schema {
        provider: Schema,
        resources: BTreeMap<String, Schema>,
        data_sources: BTreeMap<String, Schema>,
        diagnostics: Diagnostics,
    },
    /// Validation, configure and stop results
    Diagnostics { diagnostics: Diagnostics },
    PlannedState {
        planned_state: Snapshot,
        diagnostics: Diagnostics,
    },
    NewState {
        new_state: Snapshot,
        diagnostics: Diagnostics,
    },
    State {
        state: Snapshot,
        diagnostics: Diagnostics,
    },
    /// The request could not be handled at all
    Error { diagnostics: Diagnostics },
}

impl Response {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            Self::Schema { diagnostics, .. }
            | Self::Diagnostics { diagnostics }
            | Self::PlannedState { diagnostics, .. }
            | Self::NewState { diagnostics, .. }
            | Self::State { diagnostics, .. }
            | Self::Error { diagnostics } => diagnostics,
        }
    }
}

/// Errors that end the serve loop
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("I/O error on plugin transport: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Handshake line announced on startup
pub fn handshake() -> String {
    format!("{HANDSHAKE_PREFIX}|{PROTOCOL_VERSION}|stdio")
}

/// Serve requests until `stop_provider` or end of input
pub fn serve<P, R, W>(
    server: &mut ProviderServer<P>,
    input: R,
    mut output: W,
) -> Result<(), ServeError>
where
    P: Provider,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", handshake())?;
    output.flush()?;
    info!("Plugin ready, protocol version {PROTOCOL_VERSION}");

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!("Handling {}", request.method());
                server.handle(request)
            }
            Err(e) => {
                warn!("Malformed request: {e}");
                Response::Error {
                    diagnostics: Diagnostics::error(
                        "Malformed request",
                        format!("The request line could not be decoded: {e}"),
                    ),
                }
            }
        };

        serde_json::to_writer(&mut output, &response)?;
        writeln!(output)?;
        output.flush()?;

        if server.is_stopped() {
            info!("Stop requested, shutting down");
            break;
        }
    }

    Ok(())
}
