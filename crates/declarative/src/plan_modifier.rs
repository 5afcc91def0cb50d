//! Plan modifiers for individual attributes
//!
//! A plan modifier receives an attribute's configured value, its currently
//! planned value and its prior state, and returns the value that becomes the
//! new planned value. Modifiers attached to one attribute run as a chain in
//! declaration order: each one sees the previous modifier's output as the
//! planned value.
//!
//! [`DefaultValue`] is the policy used for optional+computed attributes: it
//! fills in a static fallback when the user left the attribute unset and no
//! earlier step already produced a value.

use crate::path::AttrPath;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Inputs to a single plan modification
#[derive(Debug)]
pub struct PlanRequest<'a, T> {
    /// Location of the attribute being planned
    pub path: &'a AttrPath,
    /// What the user wrote
    pub config: &'a Value<T>,
    /// What the pipeline has planned so far
    pub plan: &'a Value<T>,
    /// Prior state (`Null` on create)
    pub state: &'a Value<T>,
}

/// Plan-time policy for one attribute of value type `T`
pub trait PlanModifier<T>: Send + Sync + fmt::Debug {
    /// Plain-text description used in schema documentation
    fn description(&self) -> String;

    /// Return the new planned value
    fn modify(&self, req: &PlanRequest<'_, T>) -> Value<T>;
}

/// Static default for an optional+computed attribute
///
/// The fallback is fixed at construction and shared read-only by every plan
/// evaluation that uses this policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValue<T> {
    value: T,
}

/// Default policy for boolean attributes
pub type BoolDefault = DefaultValue<bool>;

/// Default policy for string attributes
pub type StringDefault = DefaultValue<String>;

impl<T: Clone> DefaultValue<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// The fallback value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Decide the final planned value
    ///
    /// 1. A configured value that is not null (including unknown, `""` and
    ///    `false`) always wins: the plan is returned untouched.
    /// 2. A plan that is already known and not null was produced by an
    ///    earlier step in the chain and is returned untouched.
    /// 3. Otherwise the fallback replaces the plan.
    pub fn reconcile(&self, configured: &Value<T>, planned: Value<T>) -> Value<T> {
        if !configured.is_null() {
            return planned;
        }

        if planned.is_known() {
            return planned;
        }

        Value::Known(self.value.clone())
    }
}

impl<T> PlanModifier<T> for DefaultValue<T>
where
    T: Clone + fmt::Debug + fmt::Display + Send + Sync,
{
    fn description(&self) -> String {
        format!("Defaults to {} when not configured", self.value)
    }

    fn modify(&self, req: &PlanRequest<'_, T>) -> Value<T> {
        self.reconcile(req.config, req.plan.clone())
    }
}

/// Boolean default policy
pub fn bool_default(value: bool) -> BoolDefault {
    DefaultValue::new(value)
}

/// String default policy
pub fn string_default(value: impl Into<String>) -> StringDefault {
    DefaultValue::new(value.into())
}

/// Keep the prior state's value while the plan would mark it unknown
///
/// Used for server-generated identifiers that never change after create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UseStateForUnknown;

impl<T: Clone> PlanModifier<T> for UseStateForUnknown {
    fn description(&self) -> String {
        "Once set, the value of this attribute in state will not change".to_string()
    }

    fn modify(&self, req: &PlanRequest<'_, T>) -> Value<T> {
        if req.plan.is_unknown() && req.state.is_known() && !req.config.is_unknown() {
            return req.state.clone();
        }
        req.plan.clone()
    }
}

/// Run a chain of modifiers in order, threading the planned value through
pub fn run_chain<T: Clone>(
    modifiers: &[Arc<dyn PlanModifier<T>>],
    path: &AttrPath,
    config: &Value<T>,
    state: &Value<T>,
    plan: Value<T>,
) -> Value<T> {
    modifiers.iter().fold(plan, |planned, modifier| {
        let req = PlanRequest {
            path,
            config,
            plan: &planned,
            state,
        };
        modifier.modify(&req)
    })
}
