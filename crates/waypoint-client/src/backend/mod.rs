//! The [`Waypoint`] client trait and its implementations.
//!
//! [`http::HttpBackend`] talks to a real server. [`MemoryBackend`] keeps
//! everything in memory and is used for testing without network access:
//!
//! ```
//! use waypoint_client::backend::{MemoryBackend, Waypoint};
//! use waypoint_client::Project;
//!
//! let backend = MemoryBackend::new();
//! backend.upsert_project(&Project::new("web")).unwrap();
//!
//! assert_eq!(backend.get_project("web").unwrap().name, "web");
//! assert!(backend.get_project("api").unwrap_err().is_not_found());
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    Application, AuthMethod, ConfigSource, Project, RunnerProfile, VersionInfo,
};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations the provider needs from a Waypoint server.
///
/// Upserts create the object when it does not exist and replace it
/// otherwise. Lookups of missing objects fail with an error whose
/// [`Error::is_not_found`] is true.
pub trait Waypoint: Send + Sync {
    /// Server version; also verifies address and token.
    fn version(&self) -> Result<VersionInfo>;

    /// Create or replace a project.
    fn upsert_project(&self, project: &Project) -> Result<Project>;

    /// Look up a project by name.
    fn get_project(&self, name: &str) -> Result<Project>;

    /// Destroy a project.
    fn destroy_project(&self, name: &str) -> Result<()>;

    /// Create or replace an application.
    fn upsert_application(&self, application: &Application) -> Result<Application>;

    /// Look up an application in a project.
    fn get_application(&self, project: &str, name: &str) -> Result<Application>;

    /// Create or replace an OIDC auth method.
    fn upsert_auth_method(&self, method: &AuthMethod) -> Result<AuthMethod>;

    /// Look up an auth method by name.
    fn get_auth_method(&self, name: &str) -> Result<AuthMethod>;

    /// Delete an auth method.
    fn delete_auth_method(&self, name: &str) -> Result<()>;

    /// Create (empty `id`) or replace a runner profile.
    fn upsert_runner_profile(&self, profile: &RunnerProfile) -> Result<RunnerProfile>;

    /// Look up a runner profile by ID.
    fn get_runner_profile(&self, id: &str) -> Result<RunnerProfile>;

    /// Delete a runner profile.
    fn delete_runner_profile(&self, id: &str) -> Result<()>;

    /// Create, replace or (with `delete` set) remove a config source.
    fn set_config_source(&self, source: &ConfigSource) -> Result<()>;

    /// Look up the config source matching `query`'s identity fields.
    fn get_config_source(&self, query: &ConfigSource) -> Result<ConfigSource>;

    /// Remove a config source.
    fn delete_config_source(&self, source: &ConfigSource) -> Result<()> {
        let mut deletion = source.clone();
        deletion.delete = true;
        self.set_config_source(&deletion)
    }
}

type ConfigSourceKey = (String, String, String, String, String);

#[derive(Debug, Default)]
struct Store {
    projects: BTreeMap<String, Project>,
    applications: BTreeMap<(String, String), Application>,
    auth_methods: BTreeMap<String, AuthMethod>,
    runner_profiles: BTreeMap<String, RunnerProfile>,
    config_sources: BTreeMap<ConfigSourceKey, ConfigSource>,
    next_id: u64,
}

/// In-memory Waypoint server.
///
/// Clones share the same store, so a test can keep a handle while the
/// provider owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored projects.
    pub fn project_count(&self) -> usize {
        self.store().projects.len()
    }

    /// Number of stored config sources.
    pub fn config_source_count(&self) -> usize {
        self.store().config_sources.len()
    }
}

impl Waypoint for MemoryBackend {
    fn version(&self) -> Result<VersionInfo> {
        Ok(VersionInfo {
            version: "v0.0.0-memory".to_string(),
            api: 1,
        })
    }

    fn upsert_project(&self, project: &Project) -> Result<Project> {
        if project.name.is_empty() {
            return Err(Error::http("project name is required", Some(400)));
        }
        let mut store = self.store();
        let applications: Vec<Application> = store
            .applications
            .values()
            .filter(|a| a.project.project == project.name)
            .cloned()
            .collect();
        let mut stored = project.clone();
        stored.applications = applications;
        store.projects.insert(project.name.clone(), stored.clone());
        debug!("memory: upserted project {}", project.name);
        Ok(stored)
    }

    fn get_project(&self, name: &str) -> Result<Project> {
        self.store()
            .projects
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("project {name:?}")))
    }

    fn destroy_project(&self, name: &str) -> Result<()> {
        let mut store = self.store();
        if store.projects.remove(name).is_none() {
            return Err(Error::not_found(format!("project {name:?}")));
        }
        store.applications.retain(|(project, _), _| project != name);
        Ok(())
    }

    fn upsert_application(&self, application: &Application) -> Result<Application> {
        let mut store = self.store();
        let project_name = application.project.project.clone();
        let Some(project) = store.projects.get_mut(&project_name) else {
            return Err(Error::not_found(format!("project {project_name:?}")));
        };

        match project
            .applications
            .iter_mut()
            .find(|a| a.name == application.name)
        {
            Some(existing) => *existing = application.clone(),
            None => project.applications.push(application.clone()),
        }

        store.applications.insert(
            (project_name, application.name.clone()),
            application.clone(),
        );
        Ok(application.clone())
    }

    fn get_application(&self, project: &str, name: &str) -> Result<Application> {
        self.store()
            .applications
            .get(&(project.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("application {name:?} in project {project:?}")))
    }

    fn upsert_auth_method(&self, method: &AuthMethod) -> Result<AuthMethod> {
        self.store()
            .auth_methods
            .insert(method.name.clone(), method.clone());
        let mut returned = method.clone();
        returned.oidc.client_secret.clear();
        Ok(returned)
    }

    fn get_auth_method(&self, name: &str) -> Result<AuthMethod> {
        let mut method = self
            .store()
            .auth_methods
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("auth method {name:?}")))?;
        method.oidc.client_secret.clear();
        Ok(method)
    }

    fn delete_auth_method(&self, name: &str) -> Result<()> {
        self.store()
            .auth_methods
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("auth method {name:?}")))
    }

    fn upsert_runner_profile(&self, profile: &RunnerProfile) -> Result<RunnerProfile> {
        let mut store = self.store();
        let mut stored = profile.clone();
        if stored.id.is_empty() {
            store.next_id += 1;
            stored.id = format!("01RP{:08}", store.next_id);
        } else if !store.runner_profiles.contains_key(&stored.id) {
            return Err(Error::not_found(format!("runner profile {:?}", stored.id)));
        }
        store
            .runner_profiles
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn get_runner_profile(&self, id: &str) -> Result<RunnerProfile> {
        self.store()
            .runner_profiles
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("runner profile {id:?}")))
    }

    fn delete_runner_profile(&self, id: &str) -> Result<()> {
        self.store()
            .runner_profiles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("runner profile {id:?}")))
    }

    fn set_config_source(&self, source: &ConfigSource) -> Result<()> {
        let mut store = self.store();
        if source.delete {
            store.config_sources.remove(&source.key());
        } else {
            store.config_sources.insert(source.key(), source.clone());
        }
        Ok(())
    }

    fn get_config_source(&self, query: &ConfigSource) -> Result<ConfigSource> {
        self.store()
            .config_sources
            .get(&query.key())
            .cloned()
            .ok_or_else(|| Error::not_found(format!("config source {:?}", query.source_type)))
    }
}
