//! Read-only data sources
//!
//! Each data source looks one Waypoint object up by its identifying
//! attributes and fills in everything else as computed values. A missing
//! object is an error; there is no state to remove.

pub mod app;
pub mod auth_method;
pub mod project;
pub mod runner_profile;

use declarative::BoxedDataSource;
use waypoint_client::Waypoint;

/// All data sources, in registration order
pub fn all() -> Vec<BoxedDataSource<dyn Waypoint>> {
    vec![
        Box::new(auth_method::AuthMethodDataSource::default()),
        Box::new(project::ProjectDataSource::default()),
        Box::new(runner_profile::RunnerProfileDataSource::default()),
        Box::new(app::AppDataSource::default()),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use declarative::DataSource;
    use std::sync::Arc;
    use waypoint_client::{MemoryBackend, Waypoint};

    /// Configure a data source against a fresh in-memory server
    pub fn configured<D: DataSource<dyn Waypoint> + Default>() -> (D, MemoryBackend) {
        let backend = MemoryBackend::new();
        let mut data_source = D::default();
        let client: Arc<dyn Waypoint> = Arc::new(backend.clone());
        data_source.configure(client);
        (data_source, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{AttributeType, Schema};

    fn computed_only(schema: &Schema, inputs: &[&str]) -> bool {
        schema.attributes.iter().all(|(name, attribute)| {
            inputs.contains(&name.as_str()) || (attribute.computed && !attribute.optional)
        })
    }

    #[test]
    fn test_only_lookup_keys_are_configurable() {
        let sources = all();
        let keys = |name: &str| -> Vec<&'static str> {
            match name {
                "waypoint_app" => vec!["app_name", "project_name"],
                "waypoint_auth_method" => vec!["name"],
                "waypoint_project" => vec!["project_name"],
                "waypoint_runner_profile" => vec!["id"],
                other => panic!("unexpected data source {other}"),
            }
        };
        for source in &sources {
            let name = source.type_name("waypoint");
            let schema = source.schema();
            assert!(computed_only(&schema, &keys(&name)), "{name}");
            for key in keys(&name) {
                let attribute = schema.get(key).unwrap();
                assert!(attribute.required, "{name}.{key}");
                assert!(matches!(attribute.kind, AttributeType::String), "{name}.{key}");
            }
        }
    }
}
