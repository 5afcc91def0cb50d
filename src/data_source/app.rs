//! `waypoint_app` data source

use crate::resource::app::AppModel;
use declarative::{Attribute, AttributeType, ClientSlot, DataSource, Diagnostics, Schema, Snapshot, Value};
use log::{debug, info};
use std::sync::Arc;
use waypoint_client::Waypoint;

#[derive(Default)]
pub struct AppDataSource {
    client: ClientSlot<dyn Waypoint>,
}

pub fn schema() -> Schema {
    Schema::new()
        .description("Look up an application in a Waypoint project")
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
            Attribute::computed(AttributeType::String).description(
                "Indicates signal to be sent to any applications when their config files change.",
            ),
        )
}

impl DataSource<dyn Waypoint> for AppDataSource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_app")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn read(&self, config: &Snapshot) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let lookup: AppModel = config.get()?;
        let name = lookup.app_name.value_or_default();
        let project = lookup.project_name.value_or_default();
        info!("Reading app data source");
        debug!("Looking up app {name} in project {project}");

        let app = client.get_application(&project, &name).map_err(|e| {
            Diagnostics::error(
                "Error Reading Application",
                format!("Could not read Application with name {name}: {e}"),
            )
        })?;

        Snapshot::from_model(&AppModel {
            app_name: Value::Known(app.name),
            project_name: Value::Known(app.project.project),
            file_change_signal: Value::Known(app.file_change_signal),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::testing::configured;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use waypoint_client::{Application, Project};

    #[test]
    fn test_read_app() {
        let (data_source, backend) = configured::<AppDataSource>();
        backend.upsert_project(&Project::new("web")).unwrap();
        let mut app = Application::new("web", "frontend");
        app.file_change_signal = "SIGUSR1".into();
        backend.upsert_application(&app).unwrap();

        let state = data_source
            .read(&Snapshot::new(json!({ "app_name": "frontend", "project_name": "web" })))
            .unwrap();
        assert_eq!(
            state.into_json(),
            json!({
                "app_name": "frontend",
                "project_name": "web",
                "file_change_signal": "SIGUSR1"
            })
        );
    }

    #[test]
    fn test_missing_app_is_error() {
        let (data_source, _) = configured::<AppDataSource>();
        let err = data_source
            .read(&Snapshot::new(json!({ "app_name": "api", "project_name": "web" })))
            .unwrap_err();
        let diag = err.iter().next().unwrap();
        assert_eq!(diag.summary, "Error Reading Application");
        assert!(diag.detail.starts_with("Could not read Application with name api"));
    }
}
