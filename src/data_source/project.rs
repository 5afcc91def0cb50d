//! `waypoint_project` data source
//!
//! Git credentials are reported by user name only.

use crate::resource::project::{
    DataSourceGitModel, GitAuthBasicModel, GitAuthSshModel, VariableModel, poll_seconds,
    string_value,
};
use declarative::{
    Attribute, AttributeType, ClientSlot, DataSource, Diagnostics, Schema, Snapshot, Value,
    attributes,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use waypoint_client::{GitAuth, Project, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDataModel {
    pub project_name: Value<String>,
    pub applications: Value<Vec<String>>,
    pub project_variables: Value<Vec<VariableModel>>,
    pub remote_runners_enabled: Value<bool>,
    pub app_status_poll_seconds: Value<i64>,
    pub data_source_git: Value<DataSourceGitModel>,
    pub git_auth_basic: Value<GitAuthBasicModel>,
    pub git_auth_ssh: Value<GitAuthSshModel>,
}

#[derive(Default)]
pub struct ProjectDataSource {
    client: ClientSlot<dyn Waypoint>,
}

fn computed(kind: AttributeType, description: &str) -> Attribute {
    Attribute::computed(kind).description(description)
}

pub fn schema() -> Schema {
    Schema::new()
        .description("Look up a Waypoint project")
        .attribute(
            "project_name",
            Attribute::required(AttributeType::String).description("The name of the Waypoint project"),
        )
        .attribute(
            "applications",
            computed(
                AttributeType::list_of(AttributeType::String),
                "List of applications for this project",
            ),
        )
        .attribute(
            "project_variables",
            computed(
                AttributeType::ListNested(attributes([
                    ("name", Attribute::computed(AttributeType::String)),
                    ("value", Attribute::computed(AttributeType::String)),
                    ("sensitive", Attribute::computed(AttributeType::Bool)),
                ])),
                "List of variables in Key/value pairs associated with the Waypoint Project",
            ),
        )
        .attribute(
            "data_source_git",
            computed(
                AttributeType::SingleNested(attributes([
                    (
                        "git_url",
                        computed(AttributeType::String, "Url of git repository storing the waypoint.hcl file"),
                    ),
                    (
                        "git_path",
                        computed(
                            AttributeType::String,
                            "Path in git repository when waypoint.hcl file is stored in a sub-directory",
                        ),
                    ),
                    (
                        "git_ref",
                        computed(AttributeType::String, "Git repository ref containing waypoint.hcl file"),
                    ),
                    (
                        "ignore_changes_outside_path",
                        computed(
                            AttributeType::Bool,
                            "Whether Waypoint ignores changes outside path storing waypoint.hcl file",
                        ),
                    ),
                    (
                        "git_poll_interval_seconds",
                        computed(
                            AttributeType::Int64,
                            "Interval at which Waypoint should poll git repository for changes",
                        ),
                    ),
                    (
                        "file_change_signal",
                        computed(
                            AttributeType::String,
                            "Indicates signal to be sent to any applications when their config files change.",
                        ),
                    ),
                ])),
                "Configuration of Git repository where waypoint.hcl file is stored",
            ),
        )
        .attribute(
            "remote_runners_enabled",
            computed(AttributeType::Bool, "Enable remote runners for project"),
        )
        .attribute(
            "git_auth_basic",
            computed(
                AttributeType::SingleNested(attributes([
                    ("username", computed(AttributeType::String, "Git username")),
                    ("password", computed(AttributeType::String, "Git password").sensitive()),
                ])),
                "Basic authentication details for Git consisting of `username` and `password`",
            )
            .sensitive(),
        )
        .attribute(
            "git_auth_ssh",
            computed(
                AttributeType::SingleNested(attributes([
                    ("git_user", computed(AttributeType::String, "Git user associated with private key")),
                    (
                        "passphrase",
                        computed(AttributeType::String, "Passphrase to use with private key").sensitive(),
                    ),
                    (
                        "ssh_private_key",
                        computed(AttributeType::String, "Private key to authenticate to Git").sensitive(),
                    ),
                ])),
                "SSH authentication details for Git",
            )
            .sensitive(),
        )
        .attribute(
            "app_status_poll_seconds",
            computed(AttributeType::Int64, "Application status poll interval in seconds"),
        )
}

/// State for a looked-up project
pub fn from_project(project: &Project) -> Result<ProjectDataModel, Diagnostics> {
    let variables = project
        .variables
        .iter()
        .enumerate()
        .map(|(i, variable)| {
            Ok(VariableModel {
                name: Value::Known(variable.name.clone()),
                value: Value::Known(string_value(i, variable)?),
                sensitive: Value::Known(variable.sensitive),
            })
        })
        .collect::<Result<Vec<_>, Diagnostics>>()?;

    let mut model = ProjectDataModel {
        project_name: Value::Known(project.name.clone()),
        applications: Value::Known(project.application_names()),
        project_variables: Value::Known(variables),
        remote_runners_enabled: Value::Known(project.remote_enabled),
        app_status_poll_seconds: Value::Known(
            poll_seconds(project.status_report_poll.as_ref()).unwrap_or(0),
        ),
        ..ProjectDataModel::default()
    };

    if let Some(git) = project.git() {
        model.data_source_git = Value::Known(DataSourceGitModel {
            git_url: Value::Known(git.url.clone()),
            git_path: Value::Known(git.path.clone()),
            git_ref: Value::Known(git.git_ref.clone()),
            ignore_changes_outside_path: Value::Known(git.ignore_changes_outside_path),
            git_poll_interval_seconds: Value::Known(
                poll_seconds(project.data_source_poll.as_ref()).unwrap_or(0),
            ),
            file_change_signal: Value::Known(project.file_change_signal.clone()),
        });

        match &git.auth {
            Some(GitAuth::Basic { username, .. }) => {
                model.git_auth_basic = Value::Known(GitAuthBasicModel {
                    username: Value::Known(username.clone()),
                    password: Value::Null,
                });
            }
            Some(GitAuth::Ssh { user, .. }) => {
                model.git_auth_ssh = Value::Known(GitAuthSshModel {
                    git_user: Value::Known(user.clone()),
                    passphrase: Value::Null,
                    ssh_private_key: Value::Null,
                });
            }
            None => {}
        }
    }

    Ok(model)
}

impl DataSource<dyn Waypoint> for ProjectDataSource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_project")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn read(&self, config: &Snapshot) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let lookup: ProjectDataModel = config.get()?;
        let name = lookup.project_name.value_or_default();
        info!("Reading project data source");
        debug!("Looking up project {name}");

        let project = client.get_project(&name).map_err(|e| {
            Diagnostics::error(
                "Error Reading Project",
                format!("Could not read Project with name {name}: {e}"),
            )
        })?;

        Snapshot::from_model(&from_project(&project)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::testing::configured;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use waypoint_client::{Application, DataSource as ProjectSource, Git, Poll, Variable, VariableValue};

    fn seeded(backend: &impl Waypoint) {
        let mut project = Project::new("web");
        project.remote_enabled = true;
        project.data_source = Some(ProjectSource::Git(Git {
            url: "https://github.com/hashicorp/waypoint-examples".into(),
            git_ref: "main".into(),
            path: "docker/go".into(),
            ignore_changes_outside_path: true,
            auth: Some(GitAuth::Basic {
                username: "dev".into(),
                password: "secret".into(),
            }),
        }));
        project.data_source_poll = Some(Poll::every(30));
        project.variables.push(Variable {
            name: "region".into(),
            value: VariableValue::Str("eu".into()),
            sensitive: true,
        });
        backend.upsert_project(&project).unwrap();
        backend
            .upsert_application(&Application::new("web", "frontend"))
            .unwrap();
    }

    #[test]
    fn test_read_project() {
        let (data_source, backend) = configured::<ProjectDataSource>();
        seeded(&backend);

        let state = data_source
            .read(&Snapshot::new(json!({ "project_name": "web" })))
            .unwrap();
        let state = state.as_json();
        assert_eq!(state["applications"], json!(["frontend"]));
        assert_eq!(state["remote_runners_enabled"], json!(true));
        assert_eq!(state["app_status_poll_seconds"], json!(0));
        assert_eq!(state["data_source_git"]["git_poll_interval_seconds"], json!(30));
        assert_eq!(state["data_source_git"]["git_path"], json!("docker/go"));
        assert_eq!(
            state["project_variables"],
            json!([{ "name": "region", "value": "eu", "sensitive": true }])
        );
        assert_eq!(state["git_auth_ssh"], json!(null));
    }

    #[test]
    fn test_password_not_exposed() {
        let (data_source, backend) = configured::<ProjectDataSource>();
        seeded(&backend);

        let state = data_source
            .read(&Snapshot::new(json!({ "project_name": "web" })))
            .unwrap();
        assert_eq!(
            state.as_json()["git_auth_basic"],
            json!({ "username": "dev", "password": null })
        );
        assert!(!state.as_json().to_string().contains("secret"));
    }

    #[test]
    fn test_missing_project_is_error() {
        let (data_source, _) = configured::<ProjectDataSource>();
        let err = data_source
            .read(&Snapshot::new(json!({ "project_name": "nope" })))
            .unwrap_err();
        assert_eq!(err.iter().next().unwrap().summary, "Error Reading Project");
    }
}
