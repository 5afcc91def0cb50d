//! Request dispatch to a provider, its resources and its data sources

use crate::diag::Diagnostics;
use crate::plan::plan_resource;
use crate::protocol::{Request, Response};
use crate::provider::Provider;
use crate::resource::{BoxedDataSource, BoxedResource, unconfigured};
use crate::snapshot::Snapshot;
use crate::validate::validate;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Dispatches protocol requests
///
/// The resource and data source lists are assembled once, when the server
/// is created, and keyed by their full type names.
pub struct ProviderServer<P: Provider> {
    provider: P,
    resources: BTreeMap<String, BoxedResource<P::Client>>,
    data_sources: BTreeMap<String, BoxedDataSource<P::Client>>,
    configured: bool,
    stopped: bool,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let prefix = provider.type_name().to_string();

        let mut resources = BTreeMap::new();
        for resource in provider.resources() {
            let name = resource.type_name(&prefix);
            if resources.insert(name.clone(), resource).is_some() {
                warn!("Duplicate resource type {name}, keeping the last one");
            }
        }

        let mut data_sources = BTreeMap::new();
        for data_source in provider.data_sources() {
            let name = data_source.type_name(&prefix);
            if data_sources.insert(name.clone(), data_source).is_some() {
                warn!("Duplicate data source type {name}, keeping the last one");
            }
        }

        debug!(
            "Serving {} resources and {} data sources",
            resources.len(),
            data_sources.len()
        );

        Self {
            provider,
            resources,
            data_sources,
            configured: false,
            stopped: false,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Full type names of all resources
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Full type names of all data sources
    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Handle a single request
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::GetProviderSchema => self.schema(),
            Request::ValidateProviderConfig { config } => Response::Diagnostics {
                diagnostics: validate(&self.provider.schema(), &config),
            },
            Request::ConfigureProvider { config } => self.configure(&config),
            Request::ValidateResourceConfig { type_name, config } => {
                self.validate_resource(&type_name, &config)
            }
            Request::PlanResourceChange {
                type_name,
                config,
                prior_state,
                proposed_new_state,
            } => self.plan(&type_name, &config, &prior_state, proposed_new_state),
            Request::ApplyResourceChange {
                type_name,
                prior_state,
                planned_state,
            } => self.apply(&type_name, prior_state, planned_state),
            Request::ReadResource {
                type_name,
                current_state,
            } => self.read_resource(&type_name, current_state),
            Request::ValidateDataSourceConfig { type_name, config } => {
                self.validate_data_source(&type_name, &config)
            }
            Request::ReadDataSource { type_name, config } => {
                self.read_data_source(&type_name, &config)
            }
            Request::StopProvider => {
                self.stopped = true;
                Response::Diagnostics {
                    diagnostics: Diagnostics::new(),
                }
            }
        }
    }

    fn schema(&self) -> Response {
        Response::Schema {
            provider: self.provider.schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (name.clone(), r.schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.clone(), d.schema()))
                .collect(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn configure(&mut self, config: &Snapshot) -> Response {
        let mut diagnostics = validate(&self.provider.schema(), config);
        if diagnostics.has_error() {
            return Response::Diagnostics { diagnostics };
        }

        match self.provider.configure(config) {
            Ok(client) => {
                for resource in self.resources.values_mut() {
                    resource.configure(client.clone());
                }
                for data_source in self.data_sources.values_mut() {
                    data_source.configure(client.clone());
                }
                self.configured = true;
                info!("Configured provider {}", self.provider.type_name());
            }
            Err(errors) => diagnostics.append(errors),
        }
        Response::Diagnostics { diagnostics }
    }

    fn validate_resource(&self, type_name: &str, config: &Snapshot) -> Response {
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type("resource", type_name);
        };
        let mut diagnostics = validate(&resource.schema(), config);
        diagnostics.append(resource.validate_config(config));
        Response::Diagnostics { diagnostics }
    }

    fn plan(
        &self,
        type_name: &str,
        config: &Snapshot,
        prior: &Snapshot,
        proposed: Snapshot,
    ) -> Response {
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type("resource", type_name);
        };
        match plan_resource(&resource.schema(), config, prior, proposed) {
            Ok(planned_state) => Response::PlannedState {
                planned_state,
                diagnostics: Diagnostics::new(),
            },
            Err(diagnostics) => Response::PlannedState {
                planned_state: Snapshot::null(),
                diagnostics,
            },
        }
    }

    fn apply(&self, type_name: &str, prior: Snapshot, planned: Snapshot) -> Response {
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type("resource", type_name);
        };
        if !self.configured {
            return Response::Error {
                diagnostics: unconfigured(),
            };
        }

        let result = match (prior.is_null(), planned.is_null()) {
            (true, true) => Ok(Snapshot::null()),
            (false, true) => {
                debug!("Deleting {type_name}");
                resource.delete(&prior).map(|()| Snapshot::null())
            }
            (true, false) => {
                debug!("Creating {type_name}");
                resource.create(&planned).and_then(|s| check_known(type_name, s))
            }
            (false, false) => {
                debug!("Updating {type_name}");
                resource
                    .update(&planned, &prior)
                    .and_then(|s| check_known(type_name, s))
            }
        };

        match result {
            Ok(new_state) => Response::NewState {
                new_state,
                diagnostics: Diagnostics::new(),
            },
            Err(diagnostics) => Response::NewState {
                new_state: prior,
                diagnostics,
            },
        }
    }

    fn read_resource(&self, type_name: &str, current: Snapshot) -> Response {
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type("resource", type_name);
        };
        if !self.configured {
            return Response::Error {
                diagnostics: unconfigured(),
            };
        }

        match resource.read(&current) {
            Ok(Some(new_state)) => Response::NewState {
                new_state,
                diagnostics: Diagnostics::new(),
            },
            Ok(None) => Response::NewState {
                new_state: Snapshot::null(),
                diagnostics: Diagnostics::new(),
            },
            Err(diagnostics) => Response::NewState {
                new_state: current,
                diagnostics,
            },
        }
    }

    fn validate_data_source(&self, type_name: &str, config: &Snapshot) -> Response {
        let Some(data_source) = self.data_sources.get(type_name) else {
            return unknown_type("data source", type_name);
        };
        let mut diagnostics = validate(&data_source.schema(), config);
        diagnostics.append(data_source.validate_config(config));
        Response::Diagnostics { diagnostics }
    }

    fn read_data_source(&self, type_name: &str, config: &Snapshot) -> Response {
        let Some(data_source) = self.data_sources.get(type_name) else {
            return unknown_type("data source", type_name);
        };
        if !self.configured {
            return Response::Error {
                diagnostics: unconfigured(),
            };
        }

        match data_source.read(config) {
            Ok(state) => Response::State {
                state,
                diagnostics: Diagnostics::new(),
            },
            Err(diagnostics) => Response::State {
                state: Snapshot::null(),
                diagnostics,
            },
        }
    }
}

fn unknown_type(kind: &str, type_name: &str) -> Response {
    Response::Error {
        diagnostics: Diagnostics::error(
            format!("Unknown {kind} type"),
            format!("This provider does not support {kind} type \"{type_name}\"."),
        ),
    }
}

fn check_known(type_name: &str, state: Snapshot) -> Result<Snapshot, Diagnostics> {
    if state.contains_unknown() {
        return Err(Diagnostics::error(
            "Provider returned invalid result object after apply",
            format!(
                "After the apply operation, the provider still indicated an unknown value for {type_name}. All values must be known after apply, so this is always a bug in the provider and should be reported in the provider's own repository."
            ),
        ));
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestProvider, request};
    use crate::value::UNKNOWN_PLACEHOLDER;
    use serde_json::json;

    fn server() -> ProviderServer<TestProvider> {
        ProviderServer::new(TestProvider::default())
    }

    fn configured() -> ProviderServer<TestProvider> {
        let mut server = server();
        let response = server.handle(request(json!({
            "method": "configure_provider",
            "config": { "endpoint": "memory" },
        })));
        assert!(response.diagnostics().is_empty());
        server
    }

    fn new_state(response: Response) -> (Snapshot, Diagnostics) {
        match response {
            Response::NewState {
                new_state,
                diagnostics,
            } => (new_state, diagnostics),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_schema_lists_types() {
        let server = server();
        assert_eq!(server.resource_types().collect::<Vec<_>>(), ["test_item"]);
        assert_eq!(server.data_source_types().collect::<Vec<_>>(), ["test_item"]);

        let raw = serde_json::to_value(server.schema()).unwrap();
        assert_eq!(raw["response"], "schema");
        assert_eq!(
            raw["resources"]["test_item"]["attributes"]["enabled"]["computed"],
            true
        );
    }

    #[test]
    fn test_apply_before_configure() {
        let mut server = server();
        let response = server.handle(request(json!({
            "method": "apply_resource_change",
            "type_name": "test_item",
            "planned_state": { "name": "a" },
        })));
        let diag = response.diagnostics().iter().next().unwrap();
        assert_eq!(diag.summary, "Unconfigured client");
    }

    #[test]
    fn test_configure_missing_endpoint() {
        let mut server = server();
        let response = server.handle(request(json!({ "method": "configure_provider" })));
        assert!(response.diagnostics().has_error());
        assert!(!server.is_configured());
    }

    #[test]
    fn test_plan_apply_read_delete() {
        let mut server = configured();
        let config = json!({ "name": "a" });

        let planned = match server.handle(request(json!({
            "method": "plan_resource_change",
            "type_name": "test_item",
            "config": config,
            "proposed_new_state": config,
        }))) {
            Response::PlannedState { planned_state, .. } => planned_state,
            other => panic!("unexpected response {other:?}"),
        };
        assert_eq!(
            planned.as_json(),
            &json!({ "name": "a", "enabled": false, "id": UNKNOWN_PLACEHOLDER })
        );

        let (state, diags) = new_state(server.handle(request(json!({
            "method": "apply_resource_change",
            "type_name": "test_item",
            "planned_state": planned,
        }))));
        assert!(diags.is_empty(), "{diags}");
        assert_eq!(
            state.as_json(),
            &json!({ "name": "a", "enabled": false, "id": "item-a" })
        );

        let (read, _) = new_state(server.handle(request(json!({
            "method": "read_resource",
            "type_name": "test_item",
            "current_state": state,
        }))));
        assert_eq!(read, state);

        let (deleted, diags) = new_state(server.handle(request(json!({
            "method": "apply_resource_change",
            "type_name": "test_item",
            "prior_state": state,
        }))));
        assert!(diags.is_empty());
        assert!(deleted.is_null());

        let (gone, _) = new_state(server.handle(request(json!({
            "method": "read_resource",
            "type_name": "test_item",
            "current_state": state,
        }))));
        assert!(gone.is_null());
    }

    #[test]
    fn test_unknown_after_apply_is_error() {
        let mut server = configured();
        let (state, diags) = new_state(server.handle(request(json!({
            "method": "apply_resource_change",
            "type_name": "test_item",
            "planned_state": { "name": "leaky", "enabled": UNKNOWN_PLACEHOLDER },
        }))));
        assert!(state.is_null());
        assert_eq!(
            diags.iter().next().unwrap().summary,
            "Provider returned invalid result object after apply"
        );
    }

    #[test]
    fn test_validate_runs_resource_checks() {
        let mut server = server();
        let response = server.handle(request(json!({
            "method": "validate_resource_config",
            "type_name": "test_item",
            "config": { "name": "" },
        })));
        let diags = response.diagnostics();
        assert!(!diags.has_error());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().summary, "Empty name");
    }

    #[test]
    fn test_unknown_type() {
        let mut server = configured();
        let response = server.handle(request(json!({
            "method": "read_data_source",
            "type_name": "test_missing",
        })));
        assert!(matches!(response, Response::Error { .. }));
    }

    #[test]
    fn test_data_source_read() {
        let mut server = configured();
        let response = server.handle(request(json!({
            "method": "read_data_source",
            "type_name": "test_item",
            "config": { "name": "b" },
        })));
        match response {
            Response::State { state, diagnostics } => {
                assert!(diagnostics.is_empty());
                assert_eq!(state.as_json()["id"], json!("item-b"));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }
}
