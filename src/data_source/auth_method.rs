//! `waypoint_auth_method` data source
//!
//! Mirrors the resource without the client secret.

use declarative::{Attribute, AttributeType, ClientSlot, DataSource, Diagnostics, Schema, Snapshot, Value};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use waypoint_client::{AuthMethod, Waypoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthMethodDataModel {
    pub name: Value<String>,
    pub display_name: Value<String>,
    pub description: Value<String>,
    pub accessor_selector: Value<String>,
    pub client_id: Value<String>,
    pub discovery_url: Value<String>,
    pub allowed_redirect_uris: Value<Vec<String>>,
    pub claim_mappings: Value<BTreeMap<String, String>>,
    pub list_claim_mappings: Value<BTreeMap<String, String>>,
    pub discovery_ca_pem: Value<Vec<String>>,
    pub signing_algs: Value<Vec<String>>,
    pub scopes: Value<Vec<String>>,
    pub auds: Value<Vec<String>>,
}

impl From<AuthMethod> for AuthMethodDataModel {
    fn from(method: AuthMethod) -> Self {
        let oidc = method.oidc;
        Self {
            name: Value::Known(method.name),
            display_name: Value::Known(method.display_name),
            description: Value::Known(method.description),
            accessor_selector: Value::Known(method.access_selector),
            client_id: Value::Known(oidc.client_id),
            discovery_url: Value::Known(oidc.discovery_url),
            allowed_redirect_uris: Value::Known(oidc.allowed_redirect_uris),
            claim_mappings: Value::Known(oidc.claim_mappings),
            list_claim_mappings: Value::Known(oidc.list_claim_mappings),
            discovery_ca_pem: Value::Known(oidc.discovery_ca_pem),
            signing_algs: Value::Known(oidc.signing_algs),
            scopes: Value::Known(oidc.scopes),
            auds: Value::Known(oidc.auds),
        }
    }
}

#[derive(Default)]
pub struct AuthMethodDataSource {
    client: ClientSlot<dyn Waypoint>,
}

pub fn schema() -> Schema {
    let strings = || AttributeType::list_of(AttributeType::String);
    let mappings = || AttributeType::map_of(AttributeType::String);

    Schema::new()
        .description("Look up an OIDC auth method")
        .attribute(
            "name",
            Attribute::required(AttributeType::String).description("The name of the Auth Method"),
        )
        .attribute(
            "display_name",
            Attribute::computed(AttributeType::String).description("The display name of the Auth Method"),
        )
        .attribute(
            "description",
            Attribute::computed(AttributeType::String).description("Description of auth method"),
        )
        .attribute("accessor_selector", Attribute::computed(AttributeType::String))
        .attribute(
            "client_id",
            Attribute::computed(AttributeType::String).description("Client ID of OIDC provider"),
        )
        .attribute(
            "discovery_url",
            Attribute::computed(AttributeType::String).description("Discovery URL for OIDC provider"),
        )
        .attribute(
            "allowed_redirect_uris",
            Attribute::computed(strings()).description("Allowed URI for auth redirection."),
        )
        .attribute(
            "claim_mappings",
            Attribute::computed(mappings())
                .description("Mapping of a claim to a variable value for the access selector"),
        )
        .attribute(
            "list_claim_mappings",
            Attribute::computed(mappings()).description("Same as claim-mapping but for list values"),
        )
        .attribute(
            "discovery_ca_pem",
            Attribute::computed(strings())
                .description("Optional CA certificate chain to validate the discovery URL"),
        )
        .attribute(
            "signing_algs",
            Attribute::computed(strings())
                .description("The signing algorithms supported by the OIDC connect server"),
        )
        .attribute(
            "scopes",
            Attribute::computed(strings()).description("The optional claims scope requested."),
        )
        .attribute(
            "auds",
            Attribute::computed(strings()).description("The optional audience claims required"),
        )
}

impl DataSource<dyn Waypoint> for AuthMethodDataSource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_auth_method")
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn configure(&mut self, client: Arc<dyn Waypoint>) {
        self.client.set(client);
    }

    fn read(&self, config: &Snapshot) -> Result<Snapshot, Diagnostics> {
        let client = self.client.get()?;
        let lookup: AuthMethodDataModel = config.get()?;
        let name = lookup.name.value_or_default();
        info!("Reading auth method data source");
        debug!("Looking up auth method {name}");

        let method = client.get_auth_method(&name).map_err(|e| {
            Diagnostics::error(
                "Error Reading Auth Method",
                format!("Could not read Auth Method with ID{name}: {e}"),
            )
        })?;

        Snapshot::from_model(&AuthMethodDataModel::from(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::testing::configured;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use waypoint_client::OidcConfig;

    #[test]
    fn test_read_auth_method() {
        let (data_source, backend) = configured::<AuthMethodDataSource>();
        backend
            .upsert_auth_method(&AuthMethod {
                name: "google".into(),
                display_name: "Google".into(),
                oidc: OidcConfig {
                    client_id: "client-123".into(),
                    client_secret: "shh".into(),
                    scopes: vec!["email".into()],
                    ..OidcConfig::default()
                },
                ..AuthMethod::default()
            })
            .unwrap();

        let state = data_source
            .read(&Snapshot::new(json!({ "name": "google" })))
            .unwrap();
        let state = state.as_json();
        assert_eq!(state["display_name"], json!("Google"));
        assert_eq!(state["client_id"], json!("client-123"));
        assert_eq!(state["scopes"], json!(["email"]));
        assert_eq!(state["auds"], json!([]));
        assert!(state.get("client_secret").is_none());
        assert!(!data_source.schema().attributes.contains_key("client_secret"));
    }

    #[test]
    fn test_missing_auth_method_is_error() {
        let (data_source, _) = configured::<AuthMethodDataSource>();
        let err = data_source
            .read(&Snapshot::new(json!({ "name": "nope" })))
            .unwrap_err();
        assert_eq!(err.iter().next().unwrap().summary, "Error Reading Auth Method");
    }
}
