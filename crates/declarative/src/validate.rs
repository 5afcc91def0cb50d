//! Schema validation of configuration snapshots

use crate::diag::Diagnostics;
use crate::path::AttrPath;
use crate::schema::{AttributeType, Attributes, Schema};
use crate::snapshot::Snapshot;
use crate::value::is_unknown_json;
use serde_json::{Map, Value as Json};

/// Validate a configuration against a schema
///
/// Unknown values always pass; they are checked again once known.
pub fn validate(schema: &Schema, config: &Snapshot) -> Diagnostics {
    let mut diags = Diagnostics::new();
    match config.as_json() {
        Json::Null => validate_object(
            &schema.attributes,
            &Map::new(),
            &AttrPath::default(),
            &mut diags,
        ),
        Json::Object(fields) => {
            validate_object(&schema.attributes, fields, &AttrPath::default(), &mut diags)
        }
        _ => diags.add_error(
            "Invalid configuration",
            "The configuration must be an object.",
        ),
    }
    diags
}

fn validate_object(
    attributes: &Attributes,
    fields: &Map<String, Json>,
    base: &AttrPath,
    diags: &mut Diagnostics,
) {
    for name in fields.keys() {
        if !attributes.contains_key(name) {
            diags.add_attribute_error(
                base.attr(name),
                "Unsupported argument",
                format!("An argument named \"{name}\" is not expected here."),
            );
        }
    }

    for (name, attribute) in attributes {
        let path = base.attr(name);
        let value = fields.get(name).unwrap_or(&Json::Null);

        if is_unknown_json(value) {
            continue;
        }

        if value.is_null() {
            if attribute.required {
                diags.add_attribute_error(
                    path,
                    "Missing required argument",
                    format!("The argument \"{name}\" is required, but no definition was found."),
                );
            }
            continue;
        }

        if attribute.is_computed_only() {
            diags.add_attribute_error(
                path,
                "Invalid Configuration for Read-Only Attribute",
                format!("Cannot set value for this attribute as the provider has marked it as read-only. Remove the configuration line setting the value of \"{name}\"."),
            );
            continue;
        }

        for sibling in &attribute.conflicts_with {
            let set = fields.get(sibling).is_some_and(|v| !v.is_null());
            if set {
                diags.add_attribute_error(
                    path.clone(),
                    "Invalid Attribute Combination",
                    format!("Attribute \"{}\" cannot be specified when \"{name}\" is specified", base.attr(sibling)),
                );
            }
        }

        check_type(&attribute.kind, value, &path, diags);
    }
}

fn check_type(kind: &AttributeType, value: &Json, path: &AttrPath, diags: &mut Diagnostics) {
    if value.is_null() || is_unknown_json(value) {
        return;
    }

    let matches = match (kind, value) {
        (AttributeType::String, Json::String(_)) => true,
        (AttributeType::Bool, Json::Bool(_)) => true,
        (AttributeType::Int64, Json::Number(n)) => n.is_i64(),
        (AttributeType::List(element), Json::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                check_type(element, item, &path.index(i), diags);
            }
            true
        }
        (AttributeType::Map(element), Json::Object(entries)) => {
            for (key, item) in entries {
                check_type(element, item, &path.attr(key), diags);
            }
            true
        }
        (AttributeType::SingleNested(attributes), Json::Object(fields)) => {
            validate_object(attributes, fields, path, diags);
            true
        }
        (AttributeType::ListNested(attributes), Json::Array(items)) => {
            items.iter().enumerate().all(|(i, item)| match item {
                Json::Object(fields) => {
                    validate_object(attributes, fields, &path.index(i), diags);
                    true
                }
                _ => false,
            })
        }
        _ => false,
    };

    if !matches {
        diags.add_attribute_error(
            path.clone(),
            "Incorrect attribute value type",
            format!("Inappropriate value for attribute \"{path}\": {} required.", kind.name()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, attributes};
    use crate::value::UNKNOWN_PLACEHOLDER;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .attribute("name", Attribute::required(AttributeType::String))
            .attribute("id", Attribute::computed(AttributeType::String))
            .attribute("enabled", Attribute::optional_computed(AttributeType::Bool))
            .attribute(
                "labels",
                Attribute::optional(AttributeType::map_of(AttributeType::String)),
            )
            .attribute(
                "basic",
                Attribute::optional(AttributeType::SingleNested(attributes([(
                    "username",
                    Attribute::required(AttributeType::String),
                )])))
                .conflicts_with("ssh"),
            )
            .attribute(
                "ssh",
                Attribute::optional(AttributeType::SingleNested(attributes([(
                    "key",
                    Attribute::required(AttributeType::String),
                )])))
                .conflicts_with("basic"),
            )
            .attribute(
                "vars",
                Attribute::optional(AttributeType::ListNested(attributes([(
                    "name",
                    Attribute::required(AttributeType::String),
                )]))),
            )
    }

    fn summaries(diags: &Diagnostics) -> Vec<(String, String)> {
        diags
            .iter()
            .map(|d| {
                let path = d.attribute.as_ref().map(|p| p.to_string()).unwrap_or_default();
                (path, d.summary.clone())
            })
            .collect()
    }

    #[test]
    fn test_valid_config() {
        let config = Snapshot::new(json!({
            "name": "web",
            "enabled": false,
            "labels": { "env": "dev" },
            "vars": [{ "name": "a" }],
        }));
        assert!(validate(&schema(), &config).is_empty());
    }

    #[test]
    fn test_unknown_passes() {
        let config = Snapshot::new(json!({ "name": UNKNOWN_PLACEHOLDER }));
        assert!(validate(&schema(), &config).is_empty());
    }

    #[test]
    fn test_missing_required() {
        let diags = validate(&schema(), &Snapshot::new(json!({})));
        assert_eq!(
            summaries(&diags),
            [("name".to_string(), "Missing required argument".to_string())]
        );
    }

    #[test]
    fn test_unsupported_and_read_only() {
        let config = Snapshot::new(json!({ "name": "web", "id": "x", "colour": "red" }));
        let diags = validate(&schema(), &config);
        let found = summaries(&diags);
        assert!(found.contains(&("colour".into(), "Unsupported argument".into())));
        assert!(found.contains(&(
            "id".into(),
            "Invalid Configuration for Read-Only Attribute".into()
        )));
    }

    #[test]
    fn test_type_mismatch_nested() {
        let config = Snapshot::new(json!({
            "name": 3,
            "labels": { "env": true },
            "vars": [{ "name": "a" }, {}],
        }));
        let found = summaries(&validate(&schema(), &config));
        assert!(found.contains(&("name".into(), "Incorrect attribute value type".into())));
        assert!(found.contains(&("labels.env".into(), "Incorrect attribute value type".into())));
        assert!(found.contains(&("vars[1].name".into(), "Missing required argument".into())));
    }

    #[test]
    fn test_conflicts_with() {
        let config = Snapshot::new(json!({
            "name": "web",
            "basic": { "username": "u" },
            "ssh": { "key": "k" },
        }));
        let found = summaries(&validate(&schema(), &config));
        assert!(found.contains(&("basic".into(), "Invalid Attribute Combination".into())));
        assert!(found.contains(&("ssh".into(), "Invalid Attribute Combination".into())));
    }
}
