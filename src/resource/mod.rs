//! Managed resources
//!
//! Every resource maps one Waypoint object onto create, read, update and
//! delete calls against the shared [`Waypoint`] client. Models are plain
//! serde structs of [`Value`] fields named after the schema attributes.

pub mod app;
pub mod auth_method;
pub mod config_source;
pub mod project;
pub mod runner_profile;

use declarative::{BoxedResource, Value};
use waypoint_client::Waypoint;

/// All resources, in registration order
pub fn all() -> Vec<BoxedResource<dyn Waypoint>> {
    vec![
        Box::new(auth_method::AuthMethodResource::default()),
        Box::new(config_source::ConfigSourceResource::default()),
        Box::new(project::ProjectResource::default()),
        Box::new(runner_profile::RunnerProfileResource::default()),
        Box::new(app::AppResource::default()),
    ]
}

/// Refresh an optional attribute from a server value
///
/// The server reports unset fields as their zero value. An attribute that
/// was null in state stays null while the server still reports zero.
pub fn refreshed<T: PartialEq + Default>(prior: &Value<T>, remote: T) -> Value<T> {
    if prior.is_null() && remote == T::default() {
        Value::Null
    } else {
        Value::Known(remote)
    }
}

/// Refresh a secret the server may decline to return
pub fn secret(prior: &Value<String>, remote: &str) -> Value<String> {
    if remote.is_empty() {
        prior.clone()
    } else {
        Value::Known(remote.to_string())
    }
}
