//! The `waypoint` provider
//!
//! Declares the provider configuration block, resolves client settings and
//! builds the client shared by every resource and data source.

use crate::config::{HOST_ENV, Settings, TOKEN_ENV};
use crate::{data_source, resource};
use declarative::{
    AttrPath, Attribute, AttributeType, BoxedDataSource, BoxedResource, Diagnostics, Provider,
    Schema, Snapshot, Value,
};
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;
use waypoint_client::{ClientConfig, HttpBackend, Waypoint};

/// Builds a client from resolved settings
pub type Connector =
    Box<dyn Fn(&ClientConfig) -> waypoint_client::Result<Arc<dyn Waypoint>> + Send + Sync>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderModel {
    host: Value<String>,
    token: Value<String>,
}

pub struct WaypointProvider {
    version: String,
    env: Settings,
    file: Settings,
    connect: Connector,
}

impl WaypointProvider {
    /// Provider reading the process environment and talking HTTP
    pub fn new(file: Settings) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            env: Settings::from_env(),
            file,
            connect: Box::new(connect_http),
        }
    }

    /// Replace the environment settings
    pub fn with_env(mut self, env: Settings) -> Self {
        self.env = env;
        self
    }

    /// Replace the client constructor
    pub fn with_connector(mut self, connect: Connector) -> Self {
        self.connect = connect;
        self
    }

    fn resolve(&self, model: &ProviderModel) -> Result<ClientConfig, Diagnostics> {
        let mut diags = Diagnostics::new();

        if model.host.is_unknown() {
            diags.add_attribute_error(
                AttrPath::root("host"),
                "Unknown waypoint API Host",
                format!(
                    "The provider cannot create the waypoint API client as there is an unknown configuration value for the waypoint API host. \
                     Either target apply the source of the value first, set the value statically in the configuration, or use the {HOST_ENV} environment variable."
                ),
            );
        }
        if model.token.is_unknown() {
            diags.add_attribute_error(
                AttrPath::root("token"),
                "Unknown Waypoint API token",
                format!(
                    "The provider cannot create the Waypoint API client as there is an unknown configuration value for the waypoint API token. \
                     Either target apply the source of the value first, set the value statically in the configuration, or use the {TOKEN_ENV} environment variable."
                ),
            );
        }
        if diags.has_error() {
            return Err(diags);
        }

        let block = Settings {
            host: model.host.known().cloned(),
            token: model.token.known().cloned(),
            timeout_seconds: None,
        };
        let settings = self.env.clone().or(block).or(self.file.clone());

        if settings.host.is_none() {
            diags.add_attribute_error(
                AttrPath::root("host"),
                "Missing waypoint API Host",
                format!(
                    "The provider cannot create the waypoint API client as there is a missing or empty value for the waypoint API host. \
                     Set the host value in the configuration or use the {HOST_ENV} environment variable. \
                     If either is already set, ensure the value is not empty."
                ),
            );
        }
        if settings.token.is_none() {
            diags.add_attribute_error(
                AttrPath::root("token"),
                "Missing Waypoint API token",
                format!(
                    "The provider cannot create the waypoint API client as there is a missing or empty value for the waypoint API token. \
                     Set the token value in the configuration or use the {TOKEN_ENV} environment variable. \
                     If either is already set, ensure the value is not empty."
                ),
            );
        }

        match settings.client_config() {
            Some(config) if !diags.has_error() => Ok(config),
            _ => Err(diags),
        }
    }
}

fn connect_http(config: &ClientConfig) -> waypoint_client::Result<Arc<dyn Waypoint>> {
    let backend: Arc<dyn Waypoint> = Arc::new(HttpBackend::new(config)?);
    Ok(backend)
}

impl Provider for WaypointProvider {
    type Client = dyn Waypoint;

    fn type_name(&self) -> &str {
        "waypoint"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .description("Manage projects, applications, auth methods, runner profiles and config sources on a Waypoint server.")
            .attribute(
                "host",
                Attribute::optional(AttributeType::String)
                    .description(format!("Waypoint server address. May also be provided via the {HOST_ENV} environment variable.")),
            )
            .attribute(
                "token",
                Attribute::optional(AttributeType::String)
                    .sensitive()
                    .description(format!("Waypoint API token. May also be provided via the {TOKEN_ENV} environment variable.")),
            )
    }

    fn configure(&self, config: &Snapshot) -> Result<Arc<dyn Waypoint>, Diagnostics> {
        info!("Configuring waypoint client");
        let model: ProviderModel = config.get()?;
        let client_config = self.resolve(&model)?;

        debug!("Creating waypoint client for {}", client_config.address);
        let client = (self.connect)(&client_config).map_err(|e| {
            Diagnostics::error(
                "Unable to Create waypoint API Client",
                format!(
                    "An unexpected error occurred when creating the waypoint API client. \
                     If the error is not clear, please contact the provider developers.\n\n\
                     waypoint Client Error: {e}"
                ),
            )
        })?;

        info!("Configured waypoint client");
        Ok(client)
    }

    fn resources(&self) -> Vec<BoxedResource<dyn Waypoint>> {
        resource::all()
    }

    fn data_sources(&self) -> Vec<BoxedDataSource<dyn Waypoint>> {
        data_source::all()
    }
}
