//! `waypoint_runner_profile` data source

use crate::resource::runner_profile::RunnerProfileModel;
use declarative::{Attribute, AttributeType, ClientSlot, DataSource, Diagnostics, Schema, Snapshot, Value};
use log::{debug, info};
use std::sync::Arc;
use waypoint_client::{RunnerProfile, TargetRunner, Waypoint};

#[derive(Default)]
pub struct RunnerProfileDataSource {
    client: ClientSlot<dyn Waypoint>,
}

pub fn schema() -> Schema {
    let computed = |kind: AttributeType, description: &str| Attribute::computed(kind).description(description);

    Schema::new()
        .description("Look up an on-demand runner profile by ID")
        .attribute(
            "id",
            Attribute::required(AttributeType::String).description("The id of the Runner profile"),
        )
        .attribute(
            "profile_name",
            computed(AttributeType::String, "The name of the Runner profile"),
        )
        .attribute(
            "oci_url",
            computed(
                AttributeType::String,
                "oci_url is the OCI image that will be used to boot the on demand runner.",
            ),
        )
        .attribute(
            "plugin_type",
            computed(AttributeType::String, "Plugin type for runner i.e docker / kubernetes / aws-ecs."),
        )
        .attribute(
            "plugin_config",
            computed(AttributeType::String, "Plugin specific configuration for the runner."),
        )
        .attribute(
            "plugin_config_format",
            computed(AttributeType::String, "Format of plugin_config, either HCL or JSON."),
        )
        .attribute(
            "default",
            computed(
                AttributeType::Bool,
                "Indicates if this runner profile is the default for any new projects",
            ),
        )
        .attribute(
            "target_runner_id",
            computed(AttributeType::String, "The ID of the target runner for this profile."),
        )
        .attribute(
            "target_runner_labels",
            computed(AttributeType::map_of(AttributeType::String), "A map of labels on target runners"),
        )
        .attribute(
            "environment_variables",
            computed(
                AttributeType::map_of(AttributeType::String),
                "Any env vars that should be exposed to the on demand runner.",
            ),
        )
}

/// State for a looked-up profile
pub fn from_profile(profile: RunnerProfile) -> RunnerProfileModel {
    let (target_runner_id, target_runner_labels) = match profile.target_runner {
        Some(TargetRunner::Id { id }) => (Value::Known(id), Value::Null),
        Some(TargetRunner::Labels { labels }) => (Value::Null, Value::Known(labels)),
        Some(TargetRunner::Any {}) | None => (Value::Null, Value::Null),
    };

    RunnerProfileModel {
        id: Value::Known(profile.id),
        profile_name: Value::Known(profile.name),
        oci_url: Value::Known(profile.oci_url),
        plugin_type: Value::Known(profile.plugin_type),
        plugin_config: Value::Known(profile.plugin_config),
        plugin_config_format: Value::Known(profile.config_format.as_str().to_string()),
        default: Value::Known(profile.default),
        target_runner_id,
        target_runner_labels,
        environment_variables: Value::Known(profile.environment_variables),
    }
}

impl DataSource<dyn Waypoint> for RunnerProfileDataSource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_runner_profile")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn read(&self, config: &Snapshot) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let lookup: RunnerProfileModel = config.get()?;
        let id = lookup.id.value_or_default();
        info!("Reading runner profile data source");
        debug!("Looking up runner profile {id}");

        let profile = client.get_runner_profile(&id).map_err(|e| {
            Diagnostics::error(
                "Error Reading Runner Profile",
                format!("Could not read Runner Profile with ID {id}: {e}"),
            )
        })?;

        Snapshot::from_model(&from_profile(profile))
    }
}
