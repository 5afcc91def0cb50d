//! Provider-side plan pipeline
//!
//! Given the configuration, prior state and the host's proposed new state,
//! produce the planned state:
//!
//! 1. A null proposed state is a destroy and is returned unchanged.
//! 2. On create, or when the proposal differs from the prior state, every
//!    computed attribute left null in configuration becomes unknown.
//! 3. Each attribute's plan-modifier chain runs in declaration order, at the
//!    top level, inside single-nested objects and per list-nested element.

use crate::diag::Diagnostics;
use crate::path::AttrPath;
use crate::plan_modifier::{PlanModifier, run_chain};
use crate::schema::{Attribute, AttributeModifier, AttributeType, Attributes, Schema};
use crate::snapshot::Snapshot;
use crate::value::{UNKNOWN_PLACEHOLDER, Value};
use log::trace;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use std::sync::Arc;

static NULL: Json = Json::Null;

/// Plan a resource change
pub fn plan_resource(
    schema: &Schema,
    config: &Snapshot,
    prior: &Snapshot,
    proposed: Snapshot,
) -> Result<Snapshot, Diagnostics> {
    if proposed.is_null() {
        return Ok(proposed);
    }

    let mut planned = proposed.into_json();

    if prior.is_null() || prior.as_json() != &planned {
        mark_computed_unknown(&schema.attributes, config.as_json(), &mut planned);
    }

    let mut diags = Diagnostics::new();
    modify_object(
        &schema.attributes,
        &AttrPath::default(),
        config.as_json(),
        prior.as_json(),
        &mut planned,
        &mut diags,
    );

    if diags.has_error() {
        return Err(diags);
    }
    Ok(Snapshot::new(planned))
}

fn field<'a>(object: &'a Json, name: &str) -> &'a Json {
    object.get(name).unwrap_or(&NULL)
}

fn element(list: &Json, index: usize) -> &Json {
    list.get(index).unwrap_or(&NULL)
}

fn mark_computed_unknown(attributes: &Attributes, config: &Json, planned: &mut Json) {
    let Some(fields) = planned.as_object_mut() else {
        return;
    };

    for (name, attribute) in attributes {
        let configured = field(config, name);

        if attribute.computed && configured.is_null() {
            fields.insert(name.clone(), Json::String(UNKNOWN_PLACEHOLDER.to_string()));
            continue;
        }

        let Some(child) = fields.get_mut(name) else {
            continue;
        };
        match &attribute.kind {
            AttributeType::SingleNested(nested) => mark_computed_unknown(nested, configured, child),
            AttributeType::ListNested(nested) => {
                if let Some(items) = child.as_array_mut() {
                    for (i, item) in items.iter_mut().enumerate() {
                        mark_computed_unknown(nested, element(configured, i), item);
                    }
                }
            }
            _ => {}
        }
    }
}

fn modify_object(
    attributes: &Attributes,
    base: &AttrPath,
    config: &Json,
    state: &Json,
    planned: &mut Json,
    diags: &mut Diagnostics,
) {
    for (name, attribute) in attributes {
        let path = base.attr(name);
        let configured = field(config, name);
        let prior = field(state, name);

        if !attribute.plan_modifiers.is_empty() {
            let current = field(planned, name).clone();
            match modify_attribute(attribute, &path, configured, prior, current) {
                Ok(next) => {
                    trace!("Planned {path} = {next}");
                    if let Some(fields) = planned.as_object_mut() {
                        fields.insert(name.clone(), next);
                    }
                }
                Err(e) => diags.add_attribute_error(
                    path.clone(),
                    "Plan Modification Error",
                    format!("Unable to decode values for \"{path}\": {e}"),
                ),
            }
        }

        let Some(child) = planned.get_mut(name.as_str()) else {
            continue;
        };
        match &attribute.kind {
            AttributeType::SingleNested(nested) if child.is_object() => {
                modify_object(nested, &path, configured, prior, child, diags);
            }
            AttributeType::ListNested(nested) => {
                if let Some(items) = child.as_array_mut() {
                    for (i, item) in items.iter_mut().enumerate() {
                        if item.is_object() {
                            modify_object(
                                nested,
                                &path.index(i),
                                element(configured, i),
                                element(prior, i),
                                item,
                                diags,
                            );
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn modify_attribute(
    attribute: &Attribute,
    path: &AttrPath,
    config: &Json,
    state: &Json,
    plan: Json,
) -> Result<Json, serde_json::Error> {
    match &attribute.kind {
        AttributeType::Bool => run_typed::<bool>(&attribute.plan_modifiers, path, config, state, plan),
        AttributeType::String => {
            run_typed::<String>(&attribute.plan_modifiers, path, config, state, plan)
        }
        AttributeType::Int64 => run_typed::<i64>(&attribute.plan_modifiers, path, config, state, plan),
        _ => Ok(plan),
    }
}

/// Value types that can carry plan modifiers
trait Modifiable: Clone + Serialize + DeserializeOwned + Sized + 'static {
    fn select(modifier: &AttributeModifier) -> Option<Arc<dyn PlanModifier<Self>>>;
}

impl Modifiable for bool {
    fn select(modifier: &AttributeModifier) -> Option<Arc<dyn PlanModifier<Self>>> {
        match modifier {
            AttributeModifier::Bool(m) => Some(Arc::clone(m)),
            _ => None,
        }
    }
}

impl Modifiable for String {
    fn select(modifier: &AttributeModifier) -> Option<Arc<dyn PlanModifier<Self>>> {
        match modifier {
            AttributeModifier::String(m) => Some(Arc::clone(m)),
            _ => None,
        }
    }
}

impl Modifiable for i64 {
    fn select(modifier: &AttributeModifier) -> Option<Arc<dyn PlanModifier<Self>>> {
        match modifier {
            AttributeModifier::Int64(m) => Some(Arc::clone(m)),
            _ => None,
        }
    }
}

fn run_typed<T: Modifiable>(
    modifiers: &[AttributeModifier],
    path: &AttrPath,
    config: &Json,
    state: &Json,
    plan: Json,
) -> Result<Json, serde_json::Error> {
    let chain: Vec<_> = modifiers.iter().filter_map(T::select).collect();
    let config = Value::<T>::from_json(config)?;
    let state = Value::<T>::from_json(state)?;
    let plan = Value::<T>::from_json(&plan)?;
    run_chain(&chain, path, &config, &state, plan).to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan_modifier::{UseStateForUnknown, bool_default, string_default};
    use crate::schema::attributes;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const U: &str = UNKNOWN_PLACEHOLDER;

    fn schema() -> Schema {
        Schema::new()
            .attribute(
                "id",
                Attribute::computed(AttributeType::String)
                    .plan_modifier(AttributeModifier::string(UseStateForUnknown)),
            )
            .attribute("name", Attribute::required(AttributeType::String))
            .attribute(
                "format",
                Attribute::optional_computed(AttributeType::String)
                    .plan_modifier(AttributeModifier::string(string_default("HCL"))),
            )
            .attribute(
                "default",
                Attribute::optional_computed(AttributeType::Bool)
                    .plan_modifier(AttributeModifier::bool(bool_default(false))),
            )
            .attribute(
                "git",
                Attribute::required(AttributeType::SingleNested(attributes([
                    ("url", Attribute::optional(AttributeType::String)),
                    (
                        "ignore_outside",
                        Attribute::optional_computed(AttributeType::Bool)
                            .plan_modifier(AttributeModifier::bool(bool_default(false))),
                    ),
                ]))),
            )
            .attribute(
                "vars",
                Attribute::optional(AttributeType::ListNested(attributes([
                    ("name", Attribute::required(AttributeType::String)),
                    (
                        "sensitive",
                        Attribute::optional_computed(AttributeType::Bool)
                            .plan_modifier(AttributeModifier::bool(bool_default(true))),
                    ),
                ]))),
            )
    }

    #[test]
    fn test_destroy_is_unchanged() {
        let prior = Snapshot::new(json!({ "name": "web" }));
        let planned = plan_resource(&schema(), &Snapshot::null(), &prior, Snapshot::null()).unwrap();
        assert!(planned.is_null());
    }

    #[test]
    fn test_create_fills_defaults() {
        let config = json!({
            "name": "web",
            "git": { "url": "https://example.com/r.git" },
            "vars": [{ "name": "a" }, { "name": "b", "sensitive": false }],
        });
        let planned = plan_resource(
            &schema(),
            &Snapshot::new(config.clone()),
            &Snapshot::null(),
            Snapshot::new(config),
        )
        .unwrap();

        assert_eq!(
            planned.as_json(),
            &json!({
                "id": U,
                "name": "web",
                "format": "HCL",
                "default": false,
                "git": { "url": "https://example.com/r.git", "ignore_outside": false },
                "vars": [
                    { "name": "a", "sensitive": true },
                    { "name": "b", "sensitive": false },
                ],
            })
        );
    }

    #[test]
    fn test_explicit_values_win() {
        let config = json!({
            "name": "web",
            "format": "JSON",
            "default": true,
            "git": { "ignore_outside": true },
        });
        let planned = plan_resource(
            &schema(),
            &Snapshot::new(config.clone()),
            &Snapshot::null(),
            Snapshot::new(config),
        )
        .unwrap();
        assert_eq!(planned.as_json()["format"], json!("JSON"));
        assert_eq!(planned.as_json()["default"], json!(true));
        assert_eq!(planned.as_json()["git"]["ignore_outside"], json!(true));
    }

    #[test]
    fn test_update_keeps_id() {
        let prior = json!({
            "id": "01HRP",
            "name": "web",
            "format": "HCL",
            "default": false,
            "git": { "url": null, "ignore_outside": false },
            "vars": null,
        });
        let config = json!({ "name": "api", "git": {} });
        let mut proposed = prior.clone();
        proposed["name"] = json!("api");

        let planned = plan_resource(
            &schema(),
            &Snapshot::new(config),
            &Snapshot::new(prior),
            Snapshot::new(proposed),
        )
        .unwrap();
        assert_eq!(planned.as_json()["id"], json!("01HRP"));
        assert_eq!(planned.as_json()["format"], json!("HCL"));
        assert_eq!(planned.as_json()["default"], json!(false));
        assert!(!planned.contains_unknown());
    }

    #[test]
    fn test_no_change_keeps_prior() {
        let prior = json!({
            "id": "01HRP",
            "name": "web",
            "format": "JSON",
            "default": true,
            "git": { "url": null, "ignore_outside": false },
            "vars": null,
        });
        let config = json!({ "name": "web", "format": "JSON", "default": true, "git": {} });
        let planned = plan_resource(
            &schema(),
            &Snapshot::new(config),
            &Snapshot::new(prior.clone()),
            Snapshot::new(prior.clone()),
        )
        .unwrap();
        assert_eq!(planned.as_json(), &prior);
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let config = json!({ "name": "web", "default": "yes", "git": {} });
        let err = plan_resource(
            &schema(),
            &Snapshot::new(config.clone()),
            &Snapshot::null(),
            Snapshot::new(config),
        )
        .unwrap_err();
        let diag = err.iter().next().unwrap();
        assert_eq!(diag.summary, "Plan Modification Error");
        assert_eq!(diag.attribute, Some(AttrPath::root("default")));
    }
}
