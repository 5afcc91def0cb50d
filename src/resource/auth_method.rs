//! `waypoint_auth_method` resource
//!
//! All auth methods are OIDC. The server never returns the client secret,
//! so reads keep the secret held in state.

use super::{refreshed, secret};
use declarative::{Attribute, AttributeType, ClientSlot, Diagnostics, Resource, Schema, Snapshot, Value};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use waypoint_client::{AuthMethod, OidcConfig, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthMethodModel {
    pub name: Value<String>,
    pub display_name: Value<String>,
    pub description: Value<String>,
    pub accessor_selector: Value<String>,
    pub client_id: Value<String>,
    pub client_secret: Value<String>,
    pub discovery_url: Value<String>,
    pub allowed_redirect_uris: Value<Vec<String>>,
    pub claim_mappings: Value<BTreeMap<String, String>>,
    pub list_claim_mappings: Value<BTreeMap<String, String>>,
    pub discovery_ca_pem: Value<Vec<String>>,
    pub signing_algs: Value<Vec<String>>,
    pub scopes: Value<Vec<String>>,
    pub auds: Value<Vec<String>>,
}

#[derive(Default)]
pub struct AuthMethodResource {
    client: ClientSlot<dyn Waypoint>,
}

fn strings() -> AttributeType {
    AttributeType::list_of(AttributeType::String)
}

fn mappings() -> AttributeType {
    AttributeType::map_of(AttributeType::String)
}

pub fn schema() -> Schema {
    Schema::new()
        .description("An OIDC auth method")
        .attribute(
            "name",
            Attribute::required(AttributeType::String).description("The name of the Auth Method"),
        )
        .attribute(
            "display_name",
            Attribute::optional(AttributeType::String).description("The display name of the Auth Method"),
        )
        .attribute(
            "description",
            Attribute::optional(AttributeType::String).description("Description of auth method"),
        )
        .attribute("accessor_selector", Attribute::optional(AttributeType::String))
        .attribute(
            "client_id",
            Attribute::required(AttributeType::String).description("Client ID of OIDC provider"),
        )
        .attribute(
            "client_secret",
            Attribute::required(AttributeType::String)
                .sensitive()
                .description("Client Secret of OIDC provider"),
        )
        .attribute(
            "discovery_url",
            Attribute::required(AttributeType::String).description("Discovery URL for OIDC provider"),
        )
        .attribute(
            "allowed_redirect_uris",
            Attribute::optional(strings()).description("Allowed URI for auth redirection."),
        )
        .attribute(
            "claim_mappings",
            Attribute::optional(mappings())
                .description("Mapping of a claim to a variable value for the access selector"),
        )
        .attribute(
            "list_claim_mappings",
            Attribute::optional(mappings()).description("Same as claim_mappings but for list values"),
        )
        .attribute(
            "discovery_ca_pem",
            Attribute::optional(strings()).description(
                "Optional CA certificate chain to validate the discovery URL. \
                 Multiple CA certificates can be specified to support easier rotation",
            ),
        )
        .attribute(
            "signing_algs",
            Attribute::optional(strings()).description(
                "The signing algorithms supported by the OIDC connect server. \
                 If this isn't specified, this will default to RS256 since that should be supported according to the RFC. \
                 The string values here should be valid OIDC signing algorithms",
            ),
        )
        .attribute(
            "scopes",
            Attribute::optional(strings()).description("The optional claims scope requested."),
        )
        .attribute(
            "auds",
            Attribute::optional(strings()).description("The optional audience claims required"),
        )
}

/// Build the API request for a planned auth method
pub fn to_auth_method(plan: &AuthMethodModel) -> AuthMethod {
    AuthMethod {
        name: plan.name.value_or_default(),
        display_name: plan.display_name.value_or_default(),
        description: plan.description.value_or_default(),
        access_selector: plan.accessor_selector.value_or_default(),
        oidc: OidcConfig {
            client_id: plan.client_id.value_or_default(),
            client_secret: plan.client_secret.value_or_default(),
            discovery_url: plan.discovery_url.value_or_default(),
            allowed_redirect_uris: plan.allowed_redirect_uris.value_or_default(),
            claim_mappings: plan.claim_mappings.value_or_default(),
            list_claim_mappings: plan.list_claim_mappings.value_or_default(),
            discovery_ca_pem: plan.discovery_ca_pem.value_or_default(),
            signing_algs: plan.signing_algs.value_or_default(),
            scopes: plan.scopes.value_or_default(),
            auds: plan.auds.value_or_default(),
        },
    }
}

/// Refresh a state model from the server's view of the auth method
pub fn refresh(model: &mut AuthMethodModel, method: &AuthMethod) {
    let oidc = &method.oidc;
    model.name = Value::Known(method.name.clone());
    model.display_name = refreshed(&model.display_name, method.display_name.clone());
    model.description = refreshed(&model.description, method.description.clone());
    model.accessor_selector = refreshed(&model.accessor_selector, method.access_selector.clone());
    model.client_id = Value::Known(oidc.client_id.clone());
    model.client_secret = secret(&model.client_secret, &oidc.client_secret);
    model.discovery_url = Value::Known(oidc.discovery_url.clone());
    model.allowed_redirect_uris = refreshed(&model.allowed_redirect_uris, oidc.allowed_redirect_uris.clone());
    model.claim_mappings = refreshed(&model.claim_mappings, oidc.claim_mappings.clone());
    model.list_claim_mappings = refreshed(&model.list_claim_mappings, oidc.list_claim_mappings.clone());
    model.discovery_ca_pem = refreshed(&model.discovery_ca_pem, oidc.discovery_ca_pem.clone());
    model.signing_algs = refreshed(&model.signing_algs, oidc.signing_algs.clone());
    model.scopes = refreshed(&model.scopes, oidc.scopes.clone());
    model.auds = refreshed(&model.auds, oidc.auds.clone());
}

impl AuthMethodResource {
    fn upsert(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let model: AuthMethodModel = plan.get()?;
        let request = to_auth_method(&model);
        debug!("Upserting auth method {}", request.name);

        client.upsert_auth_method(&request).map_err(|e| {
            Diagnostics::error(
                "Error updating auth method",
                format!("Could not update auth method, unexpected error: {e}"),
            )
        })?;

        Snapshot::from_model(&model)
    }
}

impl Resource<dyn Waypoint> for AuthMethodResource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_auth_method")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Creating Auth Method");
        self.upsert(plan)
    }

    fn read(&self, state: &Snapshot) -> Result<Option<Snapshot>, Diagnostics> {
        let client = self.client.get()?;
        let mut model: AuthMethodModel = state.get()?;
        let name = model.name.value_or_default();
        debug!("Reading auth method {name}");

        let method = match client.get_auth_method(&name) {
            Ok(method) => method,
            Err(e) if e.is_not_found() => {
                info!("Auth Method not found, removing from state");
                return Ok(None);
            }
            Err(e) => {
                return Err(Diagnostics::error(
                    "Error Reading Auth Method",
                    format!("Could not read Auth Method with ID{name}: {e}"),
                ));
            }
        };

        refresh(&mut model, &method);
        Snapshot::from_model(&model).map(Some)
    }

    fn update(&self, plan: &Snapshot, _prior: &Snapshot) -> Result<Snapshot, Diagnostics> {
        info!("Updating Auth Method");
        self.upsert(plan)
    }

    fn delete(&self, state: &Snapshot) -> Result<(), Diagnostics> {
        let client = self.client.get()?;
        let model: AuthMethodModel = state.get()?;
        let name = model.name.value_or_default();
        info!("Deleting auth method {name}");

        client.delete_auth_method(&name).map_err(|e| {
            Diagnostics::error(
                "Error Deleting Waypoint Auth Method",
                format!("Could not delete auth method, unexpected error: {e}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{configured, first_summary, snapshot};
    use declarative::validate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn planned() -> Snapshot {
        snapshot(json!({
            "name": "google",
            "display_name": "Google",
            "description": null,
            "accessor_selector": "\"dev\" in list.groups",
            "client_id": "client-123",
            "client_secret": "shh",
            "discovery_url": "https://accounts.google.com",
            "allowed_redirect_uris": ["https://localhost:9702/auth/oidc-callback"],
            "claim_mappings": { "email": "email" },
            "list_claim_mappings": null,
            "discovery_ca_pem": null,
            "signing_algs": ["RS256"],
            "scopes": null,
            "auds": null
        }))
    }

    #[test]
    fn test_create_then_read_keeps_secret() {
        let (resource, backend) = configured::<AuthMethodResource>();
        let created = resource.create(&planned()).unwrap();

        let stored = backend.get_auth_method("google").unwrap();
        assert_eq!(stored.access_selector, "\"dev\" in list.groups");
        assert_eq!(stored.oidc.signing_algs, vec!["RS256".to_string()]);
        assert_eq!(stored.oidc.client_secret, "");

        let read = resource.read(&created).unwrap().unwrap();
        assert_eq!(read, created);
        assert_eq!(read.as_json()["client_secret"], json!("shh"));
    }

    #[test]
    fn test_read_missing_removes_state() {
        let (resource, _) = configured::<AuthMethodResource>();
        assert_eq!(resource.read(&planned()).unwrap(), None);
    }

    #[test]
    fn test_update_replaces_fields() {
        let (resource, backend) = configured::<AuthMethodResource>();
        let created = resource.create(&planned()).unwrap();

        let mut plan = created.clone();
        plan.set_at(&declarative::AttrPath::root("scopes"), json!(["email", "profile"]));
        let updated = resource.update(&plan, &created).unwrap();
        assert_eq!(
            backend.get_auth_method("google").unwrap().oidc.scopes,
            vec!["email".to_string(), "profile".to_string()]
        );
        assert_eq!(resource.read(&updated).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_delete() {
        let (resource, _) = configured::<AuthMethodResource>();
        let created = resource.create(&planned()).unwrap();
        resource.delete(&created).unwrap();
        assert_eq!(resource.read(&created).unwrap(), None);

        let err = resource.delete(&created).unwrap_err();
        assert_eq!(first_summary(&err), "Error Deleting Waypoint Auth Method");
    }

    #[test]
    fn test_secret_is_required_and_sensitive() {
        let schema = schema();
        assert!(schema.get("client_secret").unwrap().sensitive);

        let diags = validate(
            &schema,
            &snapshot(json!({
                "name": "google",
                "client_id": "id",
                "discovery_url": "https://accounts.google.com"
            })),
        );
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(first_summary(&diags), "Missing required argument");
    }
}
