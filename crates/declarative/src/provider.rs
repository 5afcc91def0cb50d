//! Provider trait

use crate::diag::Diagnostics;
use crate::resource::{BoxedDataSource, BoxedResource};
use crate::schema::Schema;
use crate::snapshot::Snapshot;
use std::sync::Arc;

/// A provider: its own configuration plus the resources and data sources
/// it serves
pub trait Provider: Send + Sync {
    /// Client shared with every resource and data source
    type Client: ?Sized + Send + Sync;

    /// Type name prefix for resources, e.g. `waypoint`
    fn type_name(&self) -> &str;

    fn version(&self) -> &str;

    /// Schema of the provider configuration block
    fn schema(&self) -> Schema;

    /// Build the client from the provider configuration
    fn configure(&self, config: &Snapshot) -> Result<Arc<Self::Client>, Diagnostics>;

    fn resources(&self) -> Vec<BoxedResource<Self::Client>>;

    fn data_sources(&self) -> Vec<BoxedDataSource<Self::Client>>;
}
