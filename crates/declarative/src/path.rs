//! Attribute paths into configuration, plan and state snapshots

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step in an attribute path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Index into a list
    Index(usize),
    /// Attribute name or map key
    Name(String),
}

/// Location of an attribute, e.g. `data_source_git.git_url`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrPath(Vec<PathStep>);

impl AttrPath {
    /// Path to a top-level attribute
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![PathStep::Name(name.into())])
    }

    /// Extend the path with a nested attribute name
    pub fn attr(&self, name: impl Into<String>) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Name(name.into()));
        Self(steps)
    }

    /// Extend the path with a list index
    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index));
        Self(steps)
    }

    /// Steps of this path
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Check if this is the empty (whole object) path
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the value at this path
    pub fn lookup<'a>(&self, root: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        self.0.iter().try_fold(root, |current, step| match step {
            PathStep::Name(name) => current.as_object()?.get(name),
            PathStep::Index(i) => current.as_array()?.get(*i),
        })
    }

    /// Replace the value at this path
    ///
    /// The parent must already exist as an object (or list); returns `false`
    /// when it does not, leaving `root` untouched.
    pub fn set(&self, root: &mut serde_json::Value, value: serde_json::Value) -> bool {
        let Some((last, parents)) = self.0.split_last() else {
            *root = value;
            return true;
        };

        let mut current = root;
        for step in parents {
            let next = match step {
                PathStep::Name(name) => current.as_object_mut().and_then(|o| o.get_mut(name)),
                PathStep::Index(i) => current.as_array_mut().and_then(|a| a.get_mut(*i)),
            };
            match next {
                Some(n) => current = n,
                None => return false,
            }
        }

        match last {
            PathStep::Name(name) => match current.as_object_mut() {
                Some(object) => {
                    object.insert(name.clone(), value);
                    true
                }
                None => false,
            },
            PathStep::Index(i) => match current.as_array_mut().and_then(|a| a.get_mut(*i)) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
        }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Index(index) => write!(f, "[{index}]")?,
                PathStep::Name(name) if i == 0 => write!(f, "{name}")?,
                PathStep::Name(name) => write!(f, ".{name}")?,
            }
        }
        Ok(())
    }
}
