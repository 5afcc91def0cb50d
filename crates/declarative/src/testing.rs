//! Minimal provider used by the crate's own tests

use crate::diag::Diagnostics;
use crate::path::AttrPath;
use crate::plan_modifier::{UseStateForUnknown, bool_default};
use crate::protocol::Request;
use crate::provider::Provider;
use crate::resource::{BoxedDataSource, BoxedResource, ClientSlot, DataSource, Resource};
use crate::schema::{Attribute, AttributeModifier, AttributeType, Schema};
use crate::snapshot::Snapshot;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub fn request(raw: serde_json::Value) -> Request {
    serde_json::from_value(raw).unwrap()
}

/// In-memory store standing in for a remote API
#[derive(Debug, Default)]
pub struct Store {
    items: Mutex<BTreeMap<String, ItemModel>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemModel {
    name: Value<String>,
    enabled: Value<bool>,
    id: Value<String>,
}

#[derive(Default)]
pub struct TestProvider;

impl Provider for TestProvider {
    type Client = Store;

    fn type_name(&self) -> &str {
        "test"
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    fn schema(&self) -> Schema {
        Schema::new().attribute("endpoint", Attribute::required(AttributeType::String))
    }

    fn configure(&self, _config: &Snapshot) -> Result<Arc<Store>, Diagnostics> {
        Ok(Arc::new(Store::default()))
    }

    fn resources(&self) -> Vec<BoxedResource<Store>> {
        vec![Box::new(ItemResource::default())]
    }

    fn data_sources(&self) -> Vec<BoxedDataSource<Store>> {
        vec![Box::new(ItemDataSource::default())]
    }
}

#[derive(Default)]
struct ItemResource {
    client: ClientSlot<Store>,
}

impl ItemResource {
    fn save(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        let store = self.client.get()?;
        let mut item: ItemModel = plan.get()?;
        item.id = item.name.as_ref().map(|name| format!("item-{name}"));
        if let Value::Known(id) = &item.id {
            store.items.lock().unwrap().insert(id.clone(), item.clone());
        }
        Snapshot::from_model(&item)
    }
}

impl Resource<Store> for ItemResource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_item")
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute("name", Attribute::required(AttributeType::String))
            .attribute(
                "enabled",
                Attribute::optional_computed(AttributeType::Bool)
                    .plan_modifier(AttributeModifier::bool(bool_default(false))),
            )
            .attribute(
                "id",
                Attribute::computed(AttributeType::String)
                    .plan_modifier(AttributeModifier::string(UseStateForUnknown)),
            )
    }

    fn configure(&mut self, client: Arc<Store>) {
        self.client.set(client);
    }

    fn validate_config(&self, config: &Snapshot) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if let Ok(item) = config.get::<ItemModel>()
            && item.name.known().is_some_and(|n| n.is_empty())
        {
            diags.add_attribute_warning(AttrPath::root("name"), "Empty name", "");
        }
        diags
    }

    fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
        self.save(plan)
    }

    fn read(&self, state: &Snapshot) -> Result<Option<Snapshot>, Diagnostics> {
        let store = self.client.get()?;
        let item: ItemModel = state.get()?;
        let Some(id) = item.id.known() else {
            return Ok(None);
        };
        let found = store.items.lock().unwrap().get(id).cloned();
        found.map(|item| Snapshot::from_model(&item)).transpose()
    }

    fn update(&self, plan: &Snapshot, _prior: &Snapshot) -> Result<Snapshot, Diagnostics> {
        self.save(plan)
    }

    fn delete(&self, state: &Snapshot) -> Result<(), Diagnostics> {
        let store = self.client.get()?;
        let item: ItemModel = state.get()?;
        if let Some(id) = item.id.known() {
            store.items.lock().unwrap().remove(id);
        }
        Ok(())
    }
}

#[derive(Default)]
struct ItemDataSource {
    client: ClientSlot<Store>,
}

impl DataSource<Store> for ItemDataSource {
    fn type_name(&self, provider: &str) -> String {
        format!("{provider}_item")
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute("name", Attribute::required(AttributeType::String))
            .attribute("enabled", Attribute::computed(AttributeType::Bool))
            .attribute("id", Attribute::computed(AttributeType::String))
    }

    fn configure(&mut self, client: Arc<Store>) {
        self.client.set(client);
    }

    fn read(&self, config: &Snapshot) -> Result<Snapshot, Diagnostics> {
        let store = self.client.get()?;
        let mut item: ItemModel = config.get()?;
        item.id = item.name.as_ref().map(|name| format!("item-{name}"));
        let stored = item
            .id
            .known()
            .and_then(|id| store.items.lock().unwrap().get(id).cloned());
        item.enabled = stored.map_or(Value::Known(false), |s| s.enabled);
        Snapshot::from_model(&item)
    }
}
