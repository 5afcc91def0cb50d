//! Schema declarations for providers, resources and data sources

use crate::plan_modifier::PlanModifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Attributes of an object, keyed by name
pub type Attributes = BTreeMap<String, Attribute>;

/// Type of an attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int64,
    /// List of primitive elements
    List(Box<AttributeType>),
    /// Map of string keys to primitive elements
    Map(Box<AttributeType>),
    /// A single nested object
    SingleNested(Attributes),
    /// A list of nested objects
    ListNested(Attributes),
}

impl AttributeType {
    pub fn list_of(element: AttributeType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map_of(element: AttributeType) -> Self {
        Self::Map(Box::new(element))
    }

    /// Short type name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int64 => "number",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::SingleNested(_) => "object",
            Self::ListNested(_) => "list of objects",
        }
    }
}

/// A plan modifier bound to the attribute's value type
#[derive(Clone)]
pub enum AttributeModifier {
    Bool(Arc<dyn PlanModifier<bool>>),
    String(Arc<dyn PlanModifier<String>>),
    Int64(Arc<dyn PlanModifier<i64>>),
}

impl AttributeModifier {
    pub fn bool(modifier: impl PlanModifier<bool> + 'static) -> Self {
        Self::Bool(Arc::new(modifier))
    }

    pub fn string(modifier: impl PlanModifier<String> + 'static) -> Self {
        Self::String(Arc::new(modifier))
    }

    pub fn int64(modifier: impl PlanModifier<i64> + 'static) -> Self {
        Self::Int64(Arc::new(modifier))
    }

    pub fn description(&self) -> String {
        match self {
            Self::Bool(m) => m.description(),
            Self::String(m) => m.description(),
            Self::Int64(m) => m.description(),
        }
    }

    /// Check that the modifier's value type matches the attribute type
    fn accepts(&self, kind: &AttributeType) -> bool {
        matches!(
            (self, kind),
            (Self::Bool(_), AttributeType::Bool)
                | (Self::String(_), AttributeType::String)
                | (Self::Int64(_), AttributeType::Int64)
        )
    }
}

impl fmt::Debug for AttributeModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(m) => f.debug_tuple("Bool").field(m).finish(),
            Self::String(m) => f.debug_tuple("String").field(m).finish(),
            Self::Int64(m) => f.debug_tuple("Int64").field(m).finish(),
        }
    }
}

/// A single attribute declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sibling attributes that must not be set together with this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    #[serde(skip)]
    pub plan_modifiers: Vec<AttributeModifier>,
}

impl Attribute {
    fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: None,
            conflicts_with: Vec::new(),
            plan_modifiers: Vec::new(),
        }
    }

    /// Must be set in configuration
    pub fn required(kind: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    /// May be set in configuration
    pub fn optional(kind: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(kind)
        }
    }

    /// Set by the provider only
    pub fn computed(kind: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(kind)
        }
    }

    /// May be set in configuration; the provider fills it in otherwise
    pub fn optional_computed(kind: AttributeType) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::new(kind)
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn conflicts_with(mut self, sibling: impl Into<String>) -> Self {
        self.conflicts_with.push(sibling.into());
        self
    }

    /// Append a plan modifier; modifiers run in the order they are added
    ///
    /// # Panics
    ///
    /// Panics when the modifier's value type does not match the attribute
    /// type. Schemas are static, so this is a programming error caught by
    /// the schema tests.
    pub fn plan_modifier(mut self, modifier: AttributeModifier) -> Self {
        assert!(
            modifier.accepts(&self.kind),
            "{modifier:?} cannot modify a {} attribute",
            self.kind.name()
        );
        self.plan_modifiers.push(modifier);
        self
    }

    /// Nested attributes for object-typed attributes
    pub fn nested(&self) -> Option<&Attributes> {
        match &self.kind {
            AttributeType::SingleNested(attrs) | AttributeType::ListNested(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Set only by the provider
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// Schema of a provider, resource or data source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub attributes: Attributes,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

/// Build nested attributes inline
pub fn attributes<const N: usize>(entries: [(&str, Attribute); N]) -> Attributes {
    entries
        .into_iter()
        .map(|(name, attr)| (name.to_string(), attr))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan_modifier::{UseStateForUnknown, bool_default, string_default};

    #[test]
    fn test_builders_set_flags() {
        let attr = Attribute::optional_computed(AttributeType::Bool)
            .description("flag")
            .plan_modifier(AttributeModifier::bool(bool_default(false)));
        assert!(attr.optional && attr.computed && !attr.required);
        assert!(!attr.is_computed_only());
        assert_eq!(attr.plan_modifiers.len(), 1);
        assert_eq!(
            attr.plan_modifiers[0].description(),
            "Defaults to false when not configured"
        );
    }

    #[test]
    #[should_panic(expected = "cannot modify a bool attribute")]
    fn test_modifier_type_mismatch_panics() {
        let _ = Attribute::optional_computed(AttributeType::Bool)
            .plan_modifier(AttributeModifier::string(string_default("HCL")));
    }

    #[test]
    fn test_serialize_skips_modifiers() {
        let schema = Schema::new().attribute(
            "id",
            Attribute::computed(AttributeType::String)
                .plan_modifier(AttributeModifier::string(UseStateForUnknown)),
        );
        let raw = serde_json::to_value(&schema).unwrap();
        assert_eq!(raw["attributes"]["id"]["type"], "string");
        assert_eq!(raw["attributes"]["id"]["computed"], true);
        assert!(raw["attributes"]["id"].get("plan_modifiers").is_none());
    }

    #[test]
    fn test_nested_types_serialize() {
        let kind = AttributeType::SingleNested(attributes([(
            "git_url",
            Attribute::optional(AttributeType::String),
        )]));
        let raw = serde_json::to_value(&kind).unwrap();
        assert_eq!(raw["single_nested"]["git_url"]["type"], "string");
        assert_eq!(
            serde_json::to_value(AttributeType::map_of(AttributeType::String)).unwrap(),
            serde_json::json!({ "map": "string" })
        );
    }

    #[test]
    fn test_nested_type_keeps_modifiers() {
        let kind = AttributeType::ListNested(attributes([(
            "enabled",
            Attribute::optional_computed(AttributeType::Bool)
                .plan_modifier(AttributeModifier::bool(bool_default(false))),
        )]));
        let copy = kind.clone();
        assert_eq!(copy.name(), "list of objects");
        let AttributeType::ListNested(fields) = copy else {
            panic!("expected a nested list");
        };
        assert_eq!(fields["enabled"].plan_modifiers.len(), 1);
        assert!(matches!(fields["enabled"].kind, AttributeType::Bool));
    }
}
