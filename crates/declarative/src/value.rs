//! Tri-state attribute values
//!
//! Every attribute in a configuration, plan or state snapshot is in exactly
//! one of three states:
//! - `Unknown`: the host has not computed it yet (only during planning)
//! - `Null`: explicitly absent
//! - `Known(T)`: a concrete value
//!
//! On the wire, `null` (or a missing key) decodes to `Null` and the
//! [`UNKNOWN_PLACEHOLDER`] string decodes to `Unknown`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wire placeholder for a value that is not known until apply.
pub const UNKNOWN_PLACEHOLDER: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// A single attribute value carrying explicit null/unknown state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value<T> {
    /// Not yet known (computed during apply)
    Unknown,
    /// Explicitly null or absent
    Null,
    /// A concrete value
    Known(T),
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Self::Null
    }
}

impl<T> Value<T> {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if the value is unknown
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Check if the value is known (neither null nor unknown)
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrow the concrete value, if any
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Take the concrete value, if any
    pub fn into_known(self) -> Option<T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the inner value while keeping the state tag
    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Self::Unknown => Value::Unknown,
            Self::Null => Value::Null,
            Self::Known(v) => Value::Known(v),
        }
    }

    /// Map the concrete value, preserving null and unknown
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Value<U> {
        match self {
            Self::Unknown => Value::Unknown,
            Self::Null => Value::Null,
            Self::Known(v) => Value::Known(f(v)),
        }
    }
}

impl<T: Clone + Default> Value<T> {
    /// The concrete value, or the type's zero value when null or unknown
    pub fn value_or_default(&self) -> T {
        self.known().cloned().unwrap_or_default()
    }
}

impl Value<String> {
    /// Known value, treating the empty string as null
    ///
    /// The remote API reports unset strings as `""`.
    pub fn non_empty(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Null
        } else {
            Self::Known(value)
        }
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Known(v),
            None => Self::Null,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "<unknown>"),
            Self::Null => write!(f, "<null>"),
            Self::Known(v) => write!(f, "{v}"),
        }
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unknown => serializer.serialize_str(UNKNOWN_PLACEHOLDER),
            Self::Null => serializer.serialize_none(),
            Self::Known(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

impl<T: DeserializeOwned> Value<T> {
    /// Decode a wire value
    pub fn from_json(raw: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if is_unknown_json(raw) {
            return Ok(Self::Unknown);
        }
        if raw.is_null() {
            return Ok(Self::Null);
        }
        T::deserialize(raw).map(Self::Known)
    }
}

impl<T: Serialize> Value<T> {
    /// Encode to a wire value
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Check whether a wire value is the unknown placeholder
pub fn is_unknown_json(raw: &serde_json::Value) -> bool {
    raw.as_str() == Some(UNKNOWN_PLACEHOLDER)
}

/// Check whether a wire value contains the unknown placeholder anywhere
pub fn contains_unknown(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::String(_) => is_unknown_json(raw),
        serde_json::Value::Array(items) => items.iter().any(contains_unknown),
        serde_json::Value::Object(fields) => fields.values().any(contains_unknown),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Model {
        #[serde(default)]
        name: Value<String>,
        #[serde(default)]
        enabled: Value<bool>,
        #[serde(default)]
        labels: Value<BTreeMap<String, String>>,
    }

    #[test]
    fn test_decode_tri_state() {
        assert_eq!(Value::<bool>::from_json(&json!(null)).unwrap(), Value::Null);
        assert_eq!(
            Value::<bool>::from_json(&json!(UNKNOWN_PLACEHOLDER)).unwrap(),
            Value::Unknown
        );
        assert_eq!(
            Value::<bool>::from_json(&json!(false)).unwrap(),
            Value::Known(false)
        );
        assert!(Value::<bool>::from_json(&json!("yes")).is_err());
    }

    #[test]
    fn test_missing_field_is_null() {
        let model: Model = serde_json::from_value(json!({ "name": "web" })).unwrap();
        assert_eq!(model.name, Value::Known("web".to_string()));
        assert_eq!(model.enabled, Value::Null);
        assert_eq!(model.labels, Value::Null);
    }

    #[test]
    fn test_serialize_unknown_uses_placeholder() {
        let model = Model {
            name: Value::Unknown,
            enabled: Value::Null,
            labels: Value::Known(BTreeMap::from([("env".into(), "dev".into())])),
        };
        let raw = serde_json::to_value(&model).unwrap();
        assert_eq!(
            raw,
            json!({ "name": UNKNOWN_PLACEHOLDER, "enabled": null, "labels": { "env": "dev" } })
        );
        assert!(contains_unknown(&raw));
    }

    #[test]
    fn test_value_or_default() {
        assert_eq!(Value::<String>::Null.value_or_default(), "");
        assert!(!Value::<bool>::Unknown.value_or_default());
        assert_eq!(Value::Known(7_i64).value_or_default(), 7);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(Value::non_empty(""), Value::<String>::Null);
        assert_eq!(Value::non_empty("dev"), Value::Known("dev".to_string()));
    }

    #[test]
    fn test_contains_unknown_nested() {
        assert!(!contains_unknown(&json!({ "a": [1, { "b": "x" }] })));
        assert!(contains_unknown(&json!({ "a": [1, { "b": UNKNOWN_PLACEHOLDER }] })));
    }
}
