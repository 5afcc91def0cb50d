use anyhow::{Result, bail};
use declarative::{ProviderServer, Request, Response};
use serde_json::json;

use crate::Context;
use crate::cli::SchemaArgs;
use crate::config::Settings;
use crate::provider::WaypointProvider;

pub fn run(_ctx: &Context, args: SchemaArgs) -> Result<()> {
    let provider = WaypointProvider::new(Settings::default());
    let document = render(provider, args.resource.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// The schema document, or a single type's schema when `only` is given
fn render(provider: WaypointProvider, only: Option<&str>) -> Result<serde_json::Value> {
    let mut server = ProviderServer::new(provider);
    let Response::Schema {
        provider,
        resources,
        data_sources,
        ..
    } = server.handle(Request::GetProviderSchema)
    else {
        bail!("Provider did not return a schema");
    };

    let Some(name) = only else {
        return Ok(json!({
            "provider": provider,
            "resources": resources,
            "data_sources": data_sources,
        }));
    };

    let mut found = serde_json::Map::new();
    if let Some(schema) = resources.get(name) {
        found.insert("resource".into(), serde_json::to_value(schema)?);
    }
    if let Some(schema) = data_sources.get(name) {
        found.insert("data_source".into(), serde_json::to_value(schema)?);
    }
    if found.is_empty() {
        let known: Vec<&String> = resources.keys().chain(data_sources.keys()).collect();
        bail!(
            "Unknown type '{name}'. Known types: {}",
            known
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(serde_json::Value::Object(found))
}
