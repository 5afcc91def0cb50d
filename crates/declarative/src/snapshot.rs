//! Whole-object configuration, plan and state snapshots

use crate::diag::Diagnostics;
use crate::path::AttrPath;
use crate::value::contains_unknown;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One resource instance's configuration, plan or state
///
/// A null snapshot means "no object": a resource that does not exist yet
/// (prior state on create) or that should stop existing (plan on destroy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(serde_json::Value);

impl Snapshot {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The "no object" snapshot
    pub fn null() -> Self {
        Self(serde_json::Value::Null)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_json(self) -> serde_json::Value {
        self.0
    }

    /// Decode into a typed model
    ///
    /// A null snapshot decodes as an empty object, so every `Value` field
    /// of the model comes out null.
    pub fn get<T: DeserializeOwned>(&self) -> Result<T, Diagnostics> {
        let decoded = if self.0.is_null() {
            serde_json::from_value(serde_json::Value::Object(Default::default()))
        } else {
            T::deserialize(&self.0)
        };
        decoded.map_err(|e| {
            Diagnostics::error(
                "Value Conversion Error",
                format!("An unexpected error was encountered trying to convert the snapshot: {e}"),
            )
        })
    }

    /// Encode a typed model
    pub fn from_model<T: Serialize>(model: &T) -> Result<Self, Diagnostics> {
        serde_json::to_value(model).map(Self).map_err(|e| {
            Diagnostics::error(
                "Value Conversion Error",
                format!("An unexpected error was encountered trying to build the snapshot: {e}"),
            )
        })
    }

    /// Raw value at a path
    pub fn at(&self, path: &AttrPath) -> Option<&serde_json::Value> {
        path.lookup(&self.0)
    }

    /// Replace the raw value at a path; see [`AttrPath::set`]
    pub fn set_at(&mut self, path: &AttrPath, value: serde_json::Value) -> bool {
        path.set(&mut self.0, value)
    }

    /// Check whether any value in the snapshot is still unknown
    pub fn contains_unknown(&self) -> bool {
        contains_unknown(&self.0)
    }
}

impl From<serde_json::Value> for Snapshot {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
