//! `waypoint_project` resource

use super::{refreshed, secret};
use declarative::{
    AttrPath, Attribute, AttributeModifier, AttributeType, ClientSlot, Diagnostics, Resource,
    Schema, Snapshot, Value, attributes, bool_default,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use waypoint_client::{DataSource, Git, GitAuth, Poll, Project, Variable, VariableValue, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectModel {
    pub project_name: Value<String>,
    pub project_variables: Value<Vec<VariableModel>>,
    pub remote_runners_enabled: Value<bool>,
    pub app_status_poll_seconds: Value<i64>,
    pub data_source_git: Value<DataSourceGitModel>,
    pub git_auth_basic: Value<GitAuthBasicModel>,
    pub git_auth_ssh: Value<GitAuthSshModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableModel {
    pub name: Value<String>,
    pub value: Value<String>,
    pub sensitive: Value<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceGitModel {
    pub git_url: Value<String>,
    pub git_path: Value<String>,
    pub git_ref: Value<String>,
    pub ignore_changes_outside_path: Value<bool>,
    pub git_poll_interval_seconds: Value<i64>,
    pub file_change_signal: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitAuthBasicModel {
    pub username: Value<String>,
    pub password: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitAuthSshModel {
    pub git_user: Value<String>,
    pub passphrase: Value<String>,
    pub ssh_private_key: Value<String>,
}

#[derive(Default)]
pub struct ProjectResource {
    client: ClientSlot<dyn Waypoint>,
}

/// Schema of the `waypoint_project` resource
pub fn schema() -> Schema {
    Schema::new()
        .description("A Waypoint project backed by a git repository")
        .attribute(
            "project_name",
            Attribute::required(AttributeType::String).description("The name of the Waypoint project"),
        )
        .attribute(
            "project_variables",
            Attribute::optional(AttributeType::ListNested(attributes([
                ("name", Attribute::required(AttributeType::String)),
                ("value", Attribute::required(AttributeType::String)),
                ("sensitive", Attribute::optional(AttributeType::Bool)),
            ])))
            .description("List of variables in Key/value pairs associated with the Waypoint Project"),
        )
        .attribute(
            "data_source_git",
            Attribute::required(AttributeType::SingleNested(attributes([
                (
                    "git_url",
                    Attribute::optional(AttributeType::String)
                        .description("Url of git repository storing the waypoint.hcl file"),
                ),
                (
                    "git_path",
                    Attribute::optional(AttributeType::String).description(
                        "Path in git repository when waypoint.hcl file is stored in a sub-directory",
                    ),
                ),
                (
                    "git_ref",
                    Attribute::optional(AttributeType::String)
                        .description("Git repository ref containing waypoint.hcl file"),
                ),
                (
                    "ignore_changes_outside_path",
                    Attribute::optional_computed(AttributeType::Bool)
                        .plan_modifier(AttributeModifier::bool(bool_default(false)))
                        .description("Whether Waypoint ignores changes outside path storing waypoint.hcl file"),
                ),
                (
                    "git_poll_interval_seconds",
                    Attribute::optional(AttributeType::Int64)
                        .description("Interval at which Waypoint should poll git repository for changes"),
                ),
                (
                    "file_change_signal",
                    Attribute::optional(AttributeType::String).description(
                        "Indicates signal to be sent to any applications when their config files change.",
                    ),
                ),
            ])))
            .description("Configuration of Git repository where waypoint.hcl file is stored"),
        )
        .attribute(
            "remote_runners_enabled",
            Attribute::optional(AttributeType::Bool).description("Enable remote runners for project"),
        )
        .attribute(
            "git_auth_basic",
            Attribute::optional(AttributeType::SingleNested(attributes([
                (
                    "username",
                    Attribute::required(AttributeType::String).description("Git username"),
                ),
                (
                    "password",
                    Attribute::required(AttributeType::String)
                        .sensitive()
                        .description("Git password"),
                ),
            ])))
            .sensitive()
            .description("Basic authentication details for Git consisting of `username` and `password`"),
        )
        .attribute(
            "git_auth_ssh",
            Attribute::optional(AttributeType::SingleNested(attributes([
                (
                    "git_user",
                    Attribute::optional(AttributeType::String)
                        .description("Git user associated with private key"),
                ),
                (
                    "passphrase",
                    Attribute::optional(AttributeType::String)
                        .sensitive()
                        .description("Passphrase to use with private key"),
                ),
                (
                    "ssh_private_key",
                    Attribute::required(AttributeType::String)
                        .sensitive()
                        .description("Private key to authenticate to Git"),
                ),
            ])))
            .sensitive()
            .conflicts_with("git_auth_basic")
            .description("SSH authentication details for Git"),
        )
        .attribute(
            "app_status_poll_seconds",
            Attribute::optional_computed(AttributeType::Int64)
                .description("Application status poll interval in seconds"),
        )
}

fn poll(seconds: i64) -> Option<Poll> {
    (seconds > 0).then(|| Poll::every(seconds))
}

pub fn poll_seconds(poll: Option<&Poll>) -> Option<i64> {
    poll.and_then(Poll::seconds)
}

/// Build the API request for a planned project
///
/// Basic credentials take precedence over SSH ones.
pub fn to_project(plan: &ProjectModel) -> Project {
    let git_plan = plan.data_source_git.known().cloned().unwrap_or_default();

    let auth = if let Some(basic) = plan.git_auth_basic.known() {
        Some(GitAuth::Basic {
            username: basic.username.value_or_default(),
            password: basic.password.value_or_default(),
        })
    } else {
        plan.git_auth_ssh.known().map(|ssh| GitAuth::Ssh {
            user: ssh.git_user.value_or_default(),
            password: ssh.passphrase.value_or_default(),
            private_key_pem: ssh.ssh_private_key.value_or_default(),
        })
    };

    let mut project = Project::new(plan.project_name.value_or_default());
    project.remote_enabled = plan.remote_runners_enabled.value_or_default();
    project.data_source = Some(DataSource::Git(Git {
        url: git_plan.git_url.value_or_default(),
        git_ref: git_plan.git_ref.value_or_default(),
        path: git_plan.git_path.value_or_default(),
        ignore_changes_outside_path: git_plan.ignore_changes_outside_path.value_or_default(),
        auth,
    }));
    project.data_source_poll = poll(git_plan.git_poll_interval_seconds.value_or_default());
    project.status_report_poll = poll(plan.app_status_poll_seconds.value_or_default());
    project.file_change_signal = git_plan.file_change_signal.value_or_default();
    project.variables = plan
        .project_variables
        .known()
        .map(|variables| {
            variables
                .iter()
                .map(|v| Variable {
                    name: v.name.value_or_default(),
                    value: VariableValue::Str(v.value.value_or_default()),
                    sensitive: v.sensitive.value_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();
    project
}

/// Value of the `index`th project variable, which must be a string
pub fn string_value(index: usize, variable: &Variable) -> Result<String, Diagnostics> {
    match &variable.value {
        VariableValue::Str(value) => Ok(value.clone()),
        other => Err(Diagnostics::attribute_error(
            AttrPath::root("project_variables").index(index),
            "Unsupported project variable",
            format!(
                "Variable \"{}\" has a {} value; only string values are supported.",
                variable.name,
                other.kind()
            ),
        )),
    }
}

/// Map project variables back to state; only string values are supported
pub fn variables_from(
    prior: &Value<Vec<VariableModel>>,
    variables: &[Variable],
) -> Result<Value<Vec<VariableModel>>, Diagnostics> {
    if variables.is_empty() {
        return Ok(if prior.is_null() {
            Value::Null
        } else {
            Value::Known(Vec::new())
        });
    }

    let prior_items = prior.known().map(Vec::as_slice).unwrap_or_default();
    variables
        .iter()
        .enumerate()
        .map(|(i, variable)| {
            let value = string_value(i, variable)?;
            let prior_sensitive = prior_items
                .get(i)
                .map(|p| p.sensitive.clone())
                .unwrap_or_default();
            Ok(VariableModel {
                name: Value::Known(variable.name.clone()),
                value: Value::Known(value),
                sensitive: refreshed(&prior_sensitive, variable.sensitive),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Known)
}

fn auth_from(
    auth: Option<&GitAuth>,
    basic: &Value<GitAuthBasicModel>,
    ssh: &Value<GitAuthSshModel>,
) -> (Value<GitAuthBasicModel>, Value<GitAuthSshModel>) {
    match auth {
        Some(GitAuth::Basic { username, password }) => {
            let prior = basic.known().cloned().unwrap_or_default();
            let state = GitAuthBasicModel {
                username: Value::Known(username.clone()),
                password: secret(&prior.password, password),
            };
            (Value::Known(state), Value::Null)
        }
        Some(GitAuth::Ssh {
            user,
            password,
            private_key_pem,
        }) => {
            let prior = ssh.known().cloned().unwrap_or_default();
            let state = GitAuthSshModel {
                git_user: refreshed(&prior.git_user, user.clone()),
                passphrase: secret(&prior.passphrase, password),
                ssh_private_key: secret(&prior.ssh_private_key, private_key_pem),
            };
            (Value::Null, Value::Known(state))
        }
        None => (Value::Null, Value::Null),
    }
}

/// Refresh a state model from the server's view of the project
pub fn refresh(model: &mut ProjectModel, project: &Project) -> Result<(), Diagnostics> {
    model.project_name = Value::Known(project.name.clone());
    model.remote_runners_enabled = refreshed(&model.remote_runners_enabled, project.remote_enabled);
    model.project_variables = variables_from(&model.project_variables, &project.variables)?;

    match project.git() {
        Some(git) => {
            let prior = model.data_source_git.known().cloned().unwrap_or_default();
            let interval = poll_seconds(project.data_source_poll.as_ref()).unwrap_or(0);
            model.data_source_git = Value::Known(DataSourceGitModel {
                git_url: refreshed(&prior.git_url, git.url.clone()),
                git_path: refreshed(&prior.git_path, git.path.clone()),
                git_ref: refreshed(&prior.git_ref, git.git_ref.clone()),
                ignore_changes_outside_path: Value::Known(git.ignore_changes_outside_path),
                git_poll_interval_seconds: refreshed(&prior.git_poll_interval_seconds, interval),
                file_change_signal: refreshed(
                    &prior.file_change_signal,
                    project.file_change_signal.clone(),
                ),
            });
            let (basic, ssh) = auth_from(git.auth.as_ref(), &model.git_auth_basic, &model.git_auth_ssh);
            model.git_auth_basic = basic;
            model.git_auth_ssh = ssh;
        }
        None => {
            debug!("Project {} has no git data source", project.name);
            model.data_source_git = Value::Null;
            model.git_auth_basic = Value::Null;
            model.git_auth_ssh = Value::Null;
        }
    }

    if let Some(seconds) = poll_seconds(project.status_report_poll.as_ref()) {
        model.app_status_poll_seconds = Value::Known(seconds);
    } else if !model.app_status_poll_seconds.is_known() {
        model.app_status_poll_seconds = Value::Known(0);
    }
    Ok(())
}

impl ProjectResource {
    fn upsert(&self, plan: &Snapshot, summary: &str, verb: &str) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let mut model: ProjectModel = plan.get()?;
        let request = to_project(&model);
        debug!("Upserting project {}", request.name);

        let saved = client.upsert_project(&request).map_err(|e| {
            Diagnostics::error(
                summary,
                format!("Could not {verb} project, unexpected error: {e}"),
            )
        })?;

        // Computed values the plan left open come from the server
        if !model.app_status_poll_seconds.is_known() {
            let seconds = poll_seconds(saved.status_report_poll.as_ref()).unwrap_or(0);
            model.app_status_poll_seconds = Value::Known(seconds);
        }
        if let Value::Known(git) = &mut model.data_source_git
            && !git.ignore_changes_outside_path.is_known()
        {
            git.ignore_changes_outside_path = Value::Known(
                saved
                    .git()
                    .is_some_and(|g| g.ignore_changes_outside_path),
            );
        }

        Snapshot::from_model(&model)
    }
}

impl Resource<dyn Waypoint> for ProjectResource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_project")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Creating Project");
        self.upsert(plan, "Error creating project", "create")
    }

    fn read(&self, state: &Snapshot) -> Result<Option<Snapshot>, Diagnostics> {
        let client = self.client.get()?;
        let mut model: ProjectModel = state.get()?;
        let name = model.project_name.value_or_default();
        debug!("Reading project {name}");

        let project = match client.get_project(&name) {
            Ok(project) => project,
            Err(e) if e.is_not_found() => {
                info!("Project not found, removing from state");
                return Ok(None);
            }
            Err(e) => {
                return Err(Diagnostics::error(
                    "Error Reading Project",
                    format!("Could not read Project with name {name}: {e}"),
                ));
            }
        };

        refresh(&mut model, &project)?;
        Snapshot::from_model(&model).map(Some)
    }

    fn update(&self, plan: &Snapshot, _prior: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Updating Project");
        self.upsert(plan, "Error updating project", "update")
    }

    fn delete(&self, state: &Snapshot) -> Result<(), Diagnostics> {
        let client = self.client.get()?;
        let model: ProjectModel = state.get()?;
        let name = model.project_name.value_or_default();
        info!("Deleting project {name}");

        client.destroy_project(&name).map_err(|e| {
            Diagnostics::error(
                "Error Deleting Waypoint Project",
                format!("Could not delete project, unexpected error: {e}"),
            )
        })
    }
}
