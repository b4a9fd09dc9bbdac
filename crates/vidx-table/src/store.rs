//! Row store abstraction.

use async_trait::async_trait;

use crate::error::TableResult;
use crate::types::{EntityQuery, TableEntity};

/// Key/value row store with Table-service semantics.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Create `table` if it does not exist. Returns `true` if it was created.
    async fn ensure_table(&self, table: &str) -> TableResult<bool>;

    /// Insert the entity or merge its properties into the existing row.
    async fn upsert(&self, table: &str, entity: TableEntity) -> TableResult<()>;

    /// All entities matching `query`, across continuation pages.
    async fn query(&self, table: &str, query: &EntityQuery) -> TableResult<Vec<TableEntity>>;

    /// Cheap round trip used by readiness probes.
    async fn check_connectivity(&self) -> TableResult<()>;
}
