//! # Declarative
//!
//! A small framework for declarative infrastructure providers.
//!
//! The host engine owns the plan/apply algorithm. This crate implements the
//! provider side of it: schema declaration, configuration validation, the
//! plan-modifier pipeline, and dispatch of create/read/update/delete calls to
//! resource adapters over a line-delimited JSON plugin protocol.
//!
//! ## Core Concepts
//!
//! - **Value**: a tri-state attribute value (`Unknown`, `Null`, `Known`)
//! - **Schema**: attribute declarations, including plan modifiers
//! - **PlanModifier**: per-attribute plan-time policy, e.g. [`BoolDefault`]
//! - **Resource** / **DataSource**: adapters mapping snapshots onto a client
//! - **Provider**: builds the client and lists the adapters it serves
//! - **ProviderServer**: dispatches protocol requests
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ProviderServer, serve};
//!
//! let mut server = ProviderServer::new(MyProvider::default());
//! let stdin = std::io::stdin().lock();
//! serve(&mut server, stdin, std::io::stdout())?;
//! ```

pub mod diag;
pub mod path;
pub mod plan;
pub mod plan_modifier;
pub mod protocol;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod server;
pub mod snapshot;
pub mod validate;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use path::{AttrPath, PathStep};
pub use plan::plan_resource;
pub use plan_modifier::{
    BoolDefault, DefaultValue, PlanModifier, PlanRequest, StringDefault, UseStateForUnknown,
    bool_default, run_chain, string_default,
};
pub use protocol::{
    HANDSHAKE_PREFIX, PROTOCOL_VERSION, Request, Response, ServeError, handshake, serve,
};
pub use provider::Provider;
pub use resource::{BoxedDataSource, BoxedResource, ClientSlot, DataSource, Resource};
pub use schema::{Attribute, AttributeModifier, AttributeType, Attributes, Schema, attributes};
pub use server::ProviderServer;
pub use snapshot::Snapshot;
pub use validate::validate;
pub use value::{UNKNOWN_PLACEHOLDER, Value};
