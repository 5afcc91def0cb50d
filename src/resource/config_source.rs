//! `waypoint_config_source` resource
//!
//! Config sources have no ID. They are identified by type, scope, project,
//! application and workspace, so every call rebuilds that identity from
//! state.

use super::refreshed;
use declarative::{AttrPath, Attribute, AttributeType, ClientSlot, Diagnostics, Resource, Schema, Snapshot, Value};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use waypoint_client::{ConfigSource, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSourceModel {
    #[serde(rename = "type")]
    pub source_type: Value<String>,
    pub scope: Value<String>,
    pub project: Value<String>,
    pub application: Value<String>,
    pub workspace: Value<String>,
    pub config: Value<BTreeMap<String, String>>,
}

impl ConfigSourceModel {
    /// Identity of the source, without its configuration
    fn identity(&self) -> ConfigSource {
        ConfigSource {
            source_type: self.source_type.value_or_default(),
            scope: self.scope.value_or_default(),
            project: self.project.value_or_default(),
            application: self.application.value_or_default(),
            workspace: self.workspace.value_or_default(),
            ..ConfigSource::default()
        }
    }
}

#[derive(Default)]
pub struct ConfigSourceResource {
    client: ClientSlot<dyn Waypoint>,
}

pub fn schema() -> Schema {
    Schema::new()
        .description("A dynamic configuration source")
        .attribute(
            "type",
            Attribute::required(AttributeType::String).description("Config Source type"),
        )
        .attribute(
            "project",
            Attribute::optional(AttributeType::String).description("Config Source Project"),
        )
        .attribute(
            "application",
            Attribute::optional(AttributeType::String).description("Config Source Application"),
        )
        .attribute(
            "workspace",
            Attribute::optional(AttributeType::String).description("Config Source Workspace"),
        )
        .attribute(
            "scope",
            Attribute::required(AttributeType::String).description("Config Source Scope"),
        )
        .attribute(
            "config",
            Attribute::optional(AttributeType::map_of(AttributeType::String))
                .description("Configuration for the dynamic source type"),
        )
}

/// Warn about scopes missing the attributes they need
pub fn scope_warnings(model: &ConfigSourceModel) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let scope = model.scope.value_or_default().to_lowercase();

    match scope.as_str() {
        "app" if model.project.is_null() || model.application.is_null() => {
            diags.add_attribute_warning(
                AttrPath::root("application"),
                "Missing Attribute Configuration",
                "Expected Project and Application to be configured when using Scope 'app'. \
                 The resource may return unexpected results.",
            );
        }
        "project" if model.project.is_null() => {
            diags.add_attribute_warning(
                AttrPath::root("project"),
                "Missing Attribute Configuration",
                "Expected Project to be configured when Scope is 'project'. \
                 The resource may return unexpected results.",
            );
        }
        _ => {}
    }
    diags
}

impl ConfigSourceResource {
    fn upsert(&self, plan: &Snapshot, summary: &str, verb: &str) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let model: ConfigSourceModel = plan.get()?;
        let mut request = model.identity();
        request.config = model.config.value_or_default();
        debug!("Setting config source {}", request.source_type);

        client.set_config_source(&request).map_err(|e| {
            Diagnostics::error(
                summary,
                format!("Could not {verb} config source, unexpected error: {e}"),
            )
        })?;

        Snapshot::from_model(&model)
    }
}

impl Resource<dyn Waypoint> for ConfigSourceResource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_config_source")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn validate_config(&self, config: &Snapshot) -> Diagnostics {
        match config.get::<ConfigSourceModel>() {
            Ok(model) => scope_warnings(&model),
            Err(diags) => diags,
        }
    }

    fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Creating config source");
        self.upsert(plan, "Error creating config source", "create")
    }

    fn read(&self, state: &Snapshot) -> Result<Option<Snapshot>, Diagnostics> {
        let client = self.client.get()?;
        let mut model: ConfigSourceModel = state.get()?;
        let query = model.identity();
        debug!("Reading config source {}", query.source_type);

        let source = match client.get_config_source(&query) {
            Ok(source) => source,
            Err(e) if e.is_not_found() => {
                info!("config source not found, removing from state");
                return Ok(None);
            }
            Err(e) => {
                return Err(Diagnostics::error(
                    "Error Reading config source",
                    format!(
                        "Could not read config source with type {}: {e}",
                        query.source_type
                    ),
                ));
            }
        };

        model.workspace = Value::non_empty(source.workspace);
        model.config = refreshed(&model.config, source.config);
        Snapshot::from_model(&model).map(Some)
    }

    fn update(&self, plan: &Snapshot, _prior: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Updating config source");
        self.upsert(plan, "Error updating config source", "update")
    }

    fn delete(&self, state: &Snapshot) -> Result<(), Diagnostics> {
        let client = self.client.get()?;
        let model: ConfigSourceModel = state.get()?;
        let source = model.identity();
        info!("Deleting config source {}", source.source_type);

        client.delete_config_source(&source).map_err(|e| {
            Diagnostics::error(
                "Error Deleting Waypoint config source",
                format!("Could not delete config source, unexpected error: {e}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{configured, first_summary, snapshot};
    use declarative::Severity;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn planned() -> Snapshot {
        snapshot(json!({
            "type": "vault",
            "scope": "project",
            "project": "web",
            "application": null,
            "workspace": null,
            "config": { "addr": "https://vault:8200", "token": "root" }
        }))
    }

    fn warning_paths(config: serde_json::Value) -> Vec<String> {
        let (resource, _) = configured::<ConfigSourceResource>();
        let diags = resource.validate_config(&snapshot(config));
        assert!(diags.iter().all(|d| d.severity == Severity::Warning));
        diags
            .iter()
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect()
    }

    #[test]
    fn test_create_then_read() {
        let (resource, backend) = configured::<ConfigSourceResource>();
        let created = resource.create(&planned()).unwrap();
        assert_eq!(created, planned());
        assert_eq!(backend.config_source_count(), 1);

        let read = resource.read(&created).unwrap().unwrap();
        assert_eq!(read, created);
    }

    #[test]
    fn test_read_takes_config_from_server() {
        let (resource, backend) = configured::<ConfigSourceResource>();
        let created = resource.create(&planned()).unwrap();

        let mut changed = ConfigSource {
            source_type: "vault".into(),
            scope: "project".into(),
            project: "web".into(),
            ..ConfigSource::default()
        };
        changed.config.insert("addr".into(), "https://other:8200".into());
        backend.set_config_source(&changed).unwrap();

        let read = resource.read(&created).unwrap().unwrap();
        assert_eq!(read.as_json()["config"], json!({ "addr": "https://other:8200" }));
        assert_eq!(read.as_json()["workspace"], json!(null));
    }

    #[test]
    fn test_read_missing_removes_state() {
        let (resource, _) = configured::<ConfigSourceResource>();
        assert_eq!(resource.read(&planned()).unwrap(), None);
    }

    #[test]
    fn test_delete_removes_source() {
        let (resource, backend) = configured::<ConfigSourceResource>();
        let created = resource.create(&planned()).unwrap();
        resource.delete(&created).unwrap();
        assert_eq!(backend.config_source_count(), 0);
        assert_eq!(resource.read(&created).unwrap(), None);
    }

    #[test]
    fn test_app_scope_warns_without_application() {
        let paths = warning_paths(json!({ "type": "vault", "scope": "App", "project": "web" }));
        assert_eq!(paths, ["application"]);
    }

    #[test]
    fn test_project_scope_warns_without_project() {
        let paths = warning_paths(json!({ "type": "vault", "scope": "project" }));
        assert_eq!(paths, ["project"]);
    }

    #[test]
    fn test_complete_scopes_do_not_warn() {
        assert!(warning_paths(json!({ "type": "vault", "scope": "global" })).is_empty());
        assert!(
            warning_paths(json!({
                "type": "vault",
                "scope": "app",
                "project": "web",
                "application": "api"
            }))
            .is_empty()
        );
    }

    #[test]
    fn test_unknown_project_does_not_warn() {
        let config = json!({
            "type": "vault",
            "scope": "project",
            "project": declarative::UNKNOWN_PLACEHOLDER
        });
        assert!(warning_paths(config).is_empty());
    }

    #[test]
    fn test_unconfigured_client() {
        let resource = ConfigSourceResource::default();
        let err = resource.delete(&planned()).unwrap_err();
        assert_eq!(first_summary(&err), "Unconfigured client");
    }
}
