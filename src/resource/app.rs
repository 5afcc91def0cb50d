//! `waypoint_app` resource
//!
//! Applications can be created and updated, but Waypoint has no API to
//! delete one, so delete always fails.

use declarative::{Attribute, AttributeType, ClientSlot, Diagnostics, Resource, Schema, Snapshot, Value};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use waypoint_client::{Application, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppModel {
    pub app_name: Value<String>,
    pub project_name: Value<String>,
    pub file_change_signal: Value<String>,
}

#[derive(Default)]
pub struct AppResource {
    client: ClientSlot<dyn Waypoint>,
}

pub fn schema() -> Schema {
    Schema::new()
        .description("An application inside a Waypoint project")
        .attribute(
            "app_name",
            Attribute::required(AttributeType::String).description("The name of the Waypoint application."),
        )
        .attribute(
            "project_name",
            Attribute::required(AttributeType::String).description("The name of the Waypoint project."),
        )
        .attribute(
            "file_change_signal",
            Attribute::optional(AttributeType::String).description(
                "Indicates signal to be sent to any applications when their config files change.",
            ),
        )
}

impl AppResource {
    fn upsert(&self, plan: &Snapshot, summary: &str, verb: &str) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let model: AppModel = plan.get()?;
        let name = model.app_name.value_or_default();
        let project = model.project_name.value_or_default();
        if name.is_empty() || project.is_empty() {
            return Err(Diagnostics::error(
                "App and Project are both needed for app lookup",
                "Please ensure that you have both an app and project defined in terraform.",
            ));
        }

        debug!("Upserting app {name} in project {project}");
        let mut request = Application::new(project, name);
        request.file_change_signal = model.file_change_signal.value_or_default();
        client.upsert_application(&request).map_err(|e| {
            Diagnostics::error(summary, format!("Could not {verb} app, unexpected error: {e}"))
        })?;

        Snapshot::from_model(&model)
    }
}

impl Resource<dyn Waypoint> for AppResource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_app")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Creating App");
        self.upsert(plan, "Error creating app", "create")
    }

    fn read(&self, state: &Snapshot) -> Result<Option<Snapshot>, Diagnostics> {
        info!("Reading App");
        let client = self.client.get()?;
        let mut model: AppModel = state.get()?;
        let name = model.app_name.value_or_default();
        let project = model.project_name.value_or_default();

        // A missing app is reported rather than dropped from state
        let app = client.get_application(&project, &name).map_err(|e| {
            Diagnostics::error(
                "Error Reading App",
                format!("Could not find App with name: {name} and project: {project}. {e}"),
            )
        })?;

        model.project_name = Value::Known(app.project.project);
        model.app_name = Value::Known(app.name);
        model.file_change_signal = super::refreshed(&model.file_change_signal, app.file_change_signal);
        Snapshot::from_model(&model).map(Some)
    }

    fn update(&self, plan: &Snapshot, _prior: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Updating App");
        self.upsert(plan, "Error updating app", "update")
    }

    fn delete(&self, state: &Snapshot) -> Result<(), Diagnostics> {
        info!("Deleting App");
        let _: AppModel = state.get()?;
        Err(Diagnostics::error(
            "App deletion is currently unimplemented due to this logic not existing in Waypoint",
            "UNIMPLEMENTED",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{configured, first_summary, snapshot};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use waypoint_client::Project;

    #[test]
    fn test_create_then_read() {
        let (resource, backend) = configured::<AppResource>();
        backend.upsert_project(&Project::new("web")).unwrap();

        let plan = snapshot(json!({
            "app_name": "frontend",
            "project_name": "web",
            "file_change_signal": "SIGHUP"
        }));
        let created = resource.create(&plan).unwrap();
        assert_eq!(created, plan);

        let app = backend.get_application("web", "frontend").unwrap();
        assert_eq!(app.file_change_signal, "SIGHUP");
        assert_eq!(resource.read(&created).unwrap(), Some(created));
    }

    #[test]
    fn test_create_requires_names() {
        let (resource, _) = configured::<AppResource>();
        let err = resource
            .create(&snapshot(json!({ "app_name": "", "project_name": "web" })))
            .unwrap_err();
        assert_eq!(
            first_summary(&err),
            "App and Project are both needed for app lookup"
        );
    }

    #[test]
    fn test_create_in_missing_project_fails() {
        let (resource, _) = configured::<AppResource>();
        let err = resource
            .create(&snapshot(json!({ "app_name": "api", "project_name": "nope" })))
            .unwrap_err();
        assert_eq!(first_summary(&err), "Error creating app");
    }

    #[test]
    fn test_read_missing_is_error() {
        let (resource, _) = configured::<AppResource>();
        let err = resource
            .read(&snapshot(json!({ "app_name": "api", "project_name": "web" })))
            .unwrap_err();
        let diag = err.iter().next().unwrap();
        assert_eq!(diag.summary, "Error Reading App");
        assert!(diag.detail.contains("name: api and project: web"));
    }

    #[test]
    fn test_delete_unsupported() {
        let (resource, _) = configured::<AppResource>();
        let err = resource
            .delete(&snapshot(json!({ "app_name": "api", "project_name": "web" })))
            .unwrap_err();
        let diag = err.iter().next().unwrap();
        assert_eq!(diag.detail, "UNIMPLEMENTED");
    }
}
