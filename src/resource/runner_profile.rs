//! `waypoint_runner_profile` resource
//!
//! On-demand runner profiles. The server generates the profile ID on
//! create; updates send it back to replace the profile in place.

use super::refreshed;
use declarative::{
    AttrPath, Attribute, AttributeModifier, AttributeType, ClientSlot, Diagnostics, Resource,
    Schema, Snapshot, UseStateForUnknown, Value, bool_default, string_default,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use waypoint_client::{ConfigFormat, RunnerProfile, TargetRunner, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerProfileModel {
    pub id: Value<String>,
    pub profile_name: Value<String>,
    pub oci_url: Value<String>,
    pub plugin_type: Value<String>,
    pub plugin_config: Value<String>,
    pub plugin_config_format: Value<String>,
    pub default: Value<bool>,
    pub target_runner_id: Value<String>,
    pub target_runner_labels: Value<BTreeMap<String, String>>,
    pub environment_variables: Value<BTreeMap<String, String>>,
}

#[derive(Default)]
pub struct RunnerProfileResource {
    client: ClientSlot<dyn Waypoint>,
}

pub fn schema() -> Schema {
    Schema::new()
        .description("An on-demand runner profile")
        .attribute(
            "id",
            Attribute::computed(AttributeType::String)
                .plan_modifier(AttributeModifier::string(UseStateForUnknown))
                .description("Waypoint generated ID for the runner config"),
        )
        .attribute(
            "profile_name",
            Attribute::required(AttributeType::String).description("The name of the runner profile"),
        )
        .attribute(
            "oci_url",
            Attribute::optional(AttributeType::String)
                .description("oci_url is the OCI image that will be used to boot the on demand runner."),
        )
        .attribute(
            "plugin_type",
            Attribute::optional(AttributeType::String)
                .description("Plugin type for runner i.e docker / kubernetes / aws-ecs."),
        )
        .attribute(
            "plugin_config",
            Attribute::optional(AttributeType::String).description(
                "plugin config is the configuration for the plugin that is created. \
                 It is usually HCL and is decoded like the other plugins, and is plugin specific.",
            ),
        )
        .attribute(
            "plugin_config_format",
            Attribute::optional_computed(AttributeType::String)
                .plan_modifier(AttributeModifier::string(string_default(ConfigFormat::Hcl.as_str())))
                .description("config format specifies the format of plugin_config, either HCL or JSON."),
        )
        .attribute(
            "default",
            Attribute::optional_computed(AttributeType::Bool)
                .plan_modifier(AttributeModifier::bool(bool_default(false)))
                .description("Indicates if this runner profile is the default for any new projects"),
        )
        .attribute(
            "target_runner_id",
            Attribute::optional(AttributeType::String)
                .conflicts_with("target_runner_labels")
                .description("The ID of the target runner for this profile."),
        )
        .attribute(
            "target_runner_labels",
            Attribute::optional(AttributeType::map_of(AttributeType::String))
                .conflicts_with("target_runner_id")
                .description("A map of labels on target runners"),
        )
        .attribute(
            "environment_variables",
            Attribute::optional(AttributeType::map_of(AttributeType::String))
                .description("Any env vars that should be exposed to the on demand runner."),
        )
}

/// Build the API request for a planned profile
///
/// An empty `id` asks the server to create a new profile.
pub fn to_runner_profile(plan: &RunnerProfileModel, id: String) -> Result<RunnerProfile, Diagnostics> {
    let config_format = match plan.plugin_config_format.known() {
        Some(raw) => raw.parse::<ConfigFormat>().map_err(|e| {
            Diagnostics::attribute_error(
                AttrPath::root("plugin_config_format"),
                "Invalid plugin config format",
                e,
            )
        })?,
        None => ConfigFormat::default(),
    };

    let target_runner = if let Some(runner) = plan.target_runner_id.known() {
        TargetRunner::Id { id: runner.clone() }
    } else if let Some(labels) = plan.target_runner_labels.known() {
        TargetRunner::Labels { labels: labels.clone() }
    } else {
        TargetRunner::Any {}
    };

    Ok(RunnerProfile {
        id,
        name: plan.profile_name.value_or_default(),
        oci_url: plan.oci_url.value_or_default(),
        plugin_type: plan.plugin_type.value_or_default(),
        plugin_config: plan.plugin_config.value_or_default(),
        config_format,
        default: plan.default.value_or_default(),
        target_runner: Some(target_runner),
        environment_variables: plan.environment_variables.value_or_default(),
    })
}

/// Refresh a state model from the server's view of the profile
pub fn refresh(model: &mut RunnerProfileModel, profile: &RunnerProfile) {
    model.id = Value::Known(profile.id.clone());
    model.profile_name = Value::Known(profile.name.clone());
    model.oci_url = refreshed(&model.oci_url, profile.oci_url.clone());
    model.plugin_type = refreshed(&model.plugin_type, profile.plugin_type.clone());
    model.plugin_config = refreshed(&model.plugin_config, profile.plugin_config.clone());
    model.plugin_config_format = Value::Known(profile.config_format.as_str().to_string());
    model.default = Value::Known(profile.default);
    model.environment_variables =
        refreshed(&model.environment_variables, profile.environment_variables.clone());

    match &profile.target_runner {
        Some(TargetRunner::Id { id }) => {
            model.target_runner_id = Value::Known(id.clone());
            model.target_runner_labels = Value::Null;
        }
        Some(TargetRunner::Labels { labels }) => {
            model.target_runner_id = Value::Null;
            model.target_runner_labels = refreshed(&model.target_runner_labels, labels.clone());
        }
        Some(TargetRunner::Any {}) | None => {
            model.target_runner_id = Value::Null;
            model.target_runner_labels = Value::Null;
        }
    }
}

impl RunnerProfileResource {
    fn upsert(
        &self,
        plan: &Snapshot,
        id: String,
        summary: &str,
        verb: &str,
    ) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let mut model: RunnerProfileModel = plan.get()?;
        let request = to_runner_profile(&model, id)?;
        debug!("Upserting runner profile {}", request.name);

        let saved = client.upsert_runner_profile(&request).map_err(|e| {
            Diagnostics::error(
                summary,
                format!("Could not {verb} runner profile, unexpected error: {e}"),
            )
        })?;

        model.id = Value::Known(saved.id);
        model.plugin_config_format = Value::Known(saved.config_format.as_str().to_string());
        model.default = Value::Known(saved.default);
        Snapshot::from_model(&model)
    }
}

impl Resource<dyn Waypoint> for RunnerProfileResource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_runner_profile")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Creating Runner Profile");
        self.upsert(plan, String::new(), "Error creating runner profile", "create")
    }

    fn read(&self, state: &Snapshot) -> Result<Option<Snapshot>, Diagnostics> {
        let client = self.client.get()?;
        let mut model: RunnerProfileModel = state.get()?;
        let id = model.id.value_or_default();
        debug!("Reading runner profile {id}");

        let profile = match client.get_runner_profile(&id) {
            Ok(profile) => profile,
            Err(e) if e.is_not_found() => {
                info!("Runner Profile not found, removing from state");
                return Ok(None);
            }
            Err(e) => {
                return Err(Diagnostics::error(
                    "Error Reading Runner Profile",
                    format!("Could not read Runner Profile with ID {id}: {e}"),
                ));
            }
        };

        refresh(&mut model, &profile);
        Snapshot::from_model(&model).map(Some)
    }

    fn update(&self, plan: &Snapshot, prior: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Updating Runner Profile");
        let state: RunnerProfileModel = prior.get()?;
        let id = state.id.value_or_default();
        self.upsert(plan, id, "Error updating runner profile", "update")
    }

    fn delete(&self, state: &Snapshot) -> Result<(), Diagnostics> {
        let client = self.client.get()?;
        let model: RunnerProfileModel = state.get()?;
        let id = model.id.value_or_default();
        info!("Deleting runner profile {id}");

        client.delete_runner_profile(&id).map_err(|e| {
            Diagnostics::error(
                "Error Deleting Waypoint Runner Profile",
                format!("Could not delete runner profile, unexpected error: {e}"),
            )
        })
    }
}
