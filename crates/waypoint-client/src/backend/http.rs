//! HTTP API backend.
//!
//! Talks to the Waypoint server's JSON HTTP API with a bearer token. All
//! calls are blocking and share one agent with a global timeout.

use crate::backend::Waypoint;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{
    Application, AuthMethod, ConfigSource, Project, RunnerProfile, VersionInfo,
};
use log::{debug, trace};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = concat!("terraform-provider-waypoint/", env!("CARGO_PKG_VERSION"));

/// Characters escaped in a path segment; unreserved characters pass through.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Waypoint HTTP API backend.
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, without trailing slash.
    api_base: String,
    /// Bearer token.
    token: String,
}

impl HttpBackend {
    /// Create a backend from validated settings.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Ok(Self {
            agent,
            api_base: config.base_url(),
            token: config.token.clone(),
        })
    }

    /// Create a backend with a custom API base (for testing).
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path)
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], what: &str) -> Result<T> {
        let url = self.url(path);
        trace!("GET {url} {query:?}");
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &self.authorization())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        request
            .call()
            .map_err(|e| Error::from_ureq(e, what))?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(format!("{what}: {e}")))
    }

    fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B, what: &str) -> Result<T> {
        let url = self.url(path);
        trace!("PUT {url}");
        self.agent
            .put(&url)
            .header("Authorization", &self.authorization())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_json(body)
            .map_err(|e| Error::from_ureq(e, what))?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(format!("{what}: {e}")))
    }

    fn delete(&self, path: &str, what: &str) -> Result<()> {
        let url = self.url(path);
        trace!("DELETE {url}");
        self.agent
            .delete(&url)
            .header("Authorization", &self.authorization())
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| Error::from_ureq(e, what))?;
        Ok(())
    }
}

/// Escape a single path segment.
fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

/// Query pairs selecting one config source.
fn config_source_query(query: &ConfigSource) -> [(&'static str, &str); 5] {
    [
        ("type", query.source_type.as_str()),
        ("scope", query.scope.as_str()),
        ("project", query.project.as_str()),
        ("application", query.application.as_str()),
        ("workspace", query.workspace.as_str()),
    ]
}

impl Waypoint for HttpBackend {
    fn version(&self) -> Result<VersionInfo> {
        let response: VersionResponse = self.get("version", &[], "server version")?;
        Ok(response.info)
    }

    fn upsert_project(&self, project: &Project) -> Result<Project> {
        debug!("Upserting project {}", project.name);
        let response: ProjectEnvelope = self.put(
            "projects",
            &ProjectEnvelope {
                project: project.clone(),
            },
            &format!("project {:?}", project.name),
        )?;
        Ok(response.project)
    }

    fn get_project(&self, name: &str) -> Result<Project> {
        let response: ProjectEnvelope =
            self.get(&format!("projects/{}", segment(name)), &[], &format!("project {name:?}"))?;
        Ok(response.project)
    }

    fn destroy_project(&self, name: &str) -> Result<()> {
        debug!("Destroying project {name}");
        self.delete(&format!("projects/{}", segment(name)), &format!("project {name:?}"))
    }

    fn upsert_application(&self, application: &Application) -> Result<Application> {
        let project = &application.project.project;
        debug!("Upserting application {} in {project}", application.name);
        let response: ApplicationEnvelope = self.put(
            &format!("projects/{}/applications", segment(project)),
            &ApplicationRequest {
                project: application.project.clone(),
                name: application.name.clone(),
                file_change_signal: application.file_change_signal.clone(),
            },
            &format!("project {project:?}"),
        )?;
        Ok(response.application)
    }

    fn get_application(&self, project: &str, name: &str) -> Result<Application> {
        let response: ApplicationEnvelope = self.get(
            &format!("projects/{}/applications/{}", segment(project), segment(name)),
            &[],
            &format!("application {name:?} in project {project:?}"),
        )?;
        Ok(response.application)
    }

    fn upsert_auth_method(&self, method: &AuthMethod) -> Result<AuthMethod> {
        debug!("Upserting auth method {}", method.name);
        let response: AuthMethodEnvelope = self.put(
            "auth-methods",
            &AuthMethodEnvelope {
                auth_method: method.clone(),
            },
            &format!("auth method {:?}", method.name),
        )?;
        Ok(response.auth_method)
    }

    fn get_auth_method(&self, name: &str) -> Result<AuthMethod> {
        let response: AuthMethodEnvelope = self.get(
            &format!("auth-methods/{}", segment(name)),
            &[],
            &format!("auth method {name:?}"),
        )?;
        Ok(response.auth_method)
    }

    fn delete_auth_method(&self, name: &str) -> Result<()> {
        debug!("Deleting auth method {name}");
        self.delete(
            &format!("auth-methods/{}", segment(name)),
            &format!("auth method {name:?}"),
        )
    }

    fn upsert_runner_profile(&self, profile: &RunnerProfile) -> Result<RunnerProfile> {
        debug!("Upserting runner profile {}", profile.name);
        let response: RunnerProfileEnvelope = self.put(
            "runner-profiles",
            &RunnerProfileEnvelope {
                config: profile.clone(),
            },
            &format!("runner profile {:?}", profile.id),
        )?;
        Ok(response.config)
    }

    fn get_runner_profile(&self, id: &str) -> Result<RunnerProfile> {
        let response: RunnerProfileEnvelope = self.get(
            &format!("runner-profiles/{}", segment(id)),
            &[],
            &format!("runner profile {id:?}"),
        )?;
        Ok(response.config)
    }

    fn delete_runner_profile(&self, id: &str) -> Result<()> {
        debug!("Deleting runner profile {id}");
        self.delete(
            &format!("runner-profiles/{}", segment(id)),
            &format!("runner profile {id:?}"),
        )
    }

    fn set_config_source(&self, source: &ConfigSource) -> Result<()> {
        debug!(
            "Setting config source {} (scope {}, delete {})",
            source.source_type, source.scope, source.delete
        );
        let _: serde_json::Value = self.put(
            "config-sources",
            &ConfigSourceEnvelope {
                config_source: source.clone(),
            },
            &format!("config source {:?}", source.source_type),
        )?;
        Ok(())
    }

    fn get_config_source(&self, query: &ConfigSource) -> Result<ConfigSource> {
        let response: ConfigSourceList = self.get(
            "config-sources",
            &config_source_query(query),
            &format!("config source {:?}", query.source_type),
        )?;
        response
            .config_sources
            .into_iter()
            .find(|s| s.key() == query.key())
            .ok_or_else(|| Error::not_found(format!("config source {:?}", query.source_type)))
    }
}

// =============================================================================
// API envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
struct VersionResponse {
    info: VersionInfo,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectEnvelope {
    project: Project,
}

#[derive(Debug, Serialize)]
struct ApplicationRequest {
    project: crate::types::ProjectRef,
    name: String,
    file_change_signal: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationEnvelope {
    application: Application,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthMethodEnvelope {
    auth_method: AuthMethod,
}

#[derive(Debug, Serialize, Deserialize)]
struct RunnerProfileEnvelope {
    config: RunnerProfile,
}

#[derive(Debug, Serialize)]
struct ConfigSourceEnvelope {
    config_source: ConfigSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigSourceList {
    config_sources: Vec<ConfigSource>,
}
