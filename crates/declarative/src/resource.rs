//! Resource and data source traits
//!
//! A resource adapter maps one managed entity type onto create, read,
//! update and delete calls against a client of type `C`. The client is
//! handed over once the provider is configured; until then every
//! operation that needs it reports an "Unconfigured client" error.

use crate::diag::Diagnostics;
use crate::schema::Schema;
use crate::snapshot::Snapshot;
use std::sync::Arc;

/// Core trait for managed resources
///
/// # Example
///
/// ```ignore
/// use declarative::{ClientSlot, Diagnostics, Resource, Schema, Snapshot};
///
/// struct ProjectResource {
///     client: ClientSlot<dyn Waypoint>,
/// }
///
/// impl Resource<dyn Waypoint> for ProjectResource {
///     fn type_name(&self, provider: &str) -> String {
///         format!("{provider}_project")
///     }
///
///     fn schema(&self) -> Schema {
///         project_schema()
///     }
///
///     fn configure(&mut self, client: Arc<dyn Waypoint>) {
///         self.client.set(client);
///     }
///
///     fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics> {
///         let client = self.client.get()?;
///         // ...
///     }
///     // read, update, delete
/// }
/// ```
pub trait Resource<C: ?Sized>: Send + Sync {
    /// Full type name, e.g. `waypoint_project`
    fn type_name(&self, provider: &str) -> String;

    /// Schema of the resource
    fn schema(&self) -> Schema;

    /// Receive the configured client
    fn configure(&mut self, client: Arc<C>);

    /// Resource-specific configuration checks beyond the schema
    fn validate_config(&self, _config: &Snapshot) -> Diagnostics {
        Diagnostics::new()
    }

    /// Create the remote object and return the new state
    fn create(&self, plan: &Snapshot) -> Result<Snapshot, Diagnostics>;

    /// Refresh state; `None` means the remote object is gone
    fn read(&self, state: &Snapshot) -> Result<Option<Snapshot>, Diagnostics>;

    /// Update the remote object and return the new state
    fn update(&self, plan: &Snapshot, prior: &Snapshot) -> Result<Snapshot, Diagnostics>;

    /// Delete the remote object
    fn delete(&self, state: &Snapshot) -> Result<(), Diagnostics>;
}

/// Read-only lookup of a remote object
pub trait DataSource<C: ?Sized>: Send + Sync {
    /// Full type name, e.g. `waypoint_project`
    fn type_name(&self, provider: &str) -> String;

    fn schema(&self) -> Schema;

    fn configure(&mut self, client: Arc<C>);

    fn validate_config(&self, _config: &Snapshot) -> Diagnostics {
        Diagnostics::new()
    }

    /// Look up the object described by `config`
    fn read(&self, config: &Snapshot) -> Result<Snapshot, Diagnostics>;
}

/// Boxed resource
pub type BoxedResource<C> = Box<dyn Resource<C>>;

/// Boxed data source
pub type BoxedDataSource<C> = Box<dyn DataSource<C>>;

/// Holder for a client handed over at configure time
#[derive(Debug)]
pub struct ClientSlot<C: ?Sized>(Option<Arc<C>>);

impl<C: ?Sized> Default for ClientSlot<C> {
    fn default() -> Self {
        Self(None)
    }
}

impl<C: ?Sized> ClientSlot<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, client: Arc<C>) {
        self.0 = Some(client);
    }

    /// Borrow the client, or report that configure has not run
    pub fn get(&self) -> Result<&C, Diagnostics> {
        self.0.as_deref().ok_or_else(unconfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }
}

/// Diagnostics for an operation that ran before the provider was configured
pub fn unconfigured() -> Diagnostics {
    Diagnostics::error(
        "Unconfigured client",
        "Expected a configured client. The provider must be configured before resources or data sources are used.",
    )
}
