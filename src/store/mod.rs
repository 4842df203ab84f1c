/// Data store boundary
///
/// Mist needs three things from the persistence layer: fetch one record of a
/// model kind by id, fetch every record of a kind, and a hook that fires after
/// a record of a given kind was updated. `SqliteStore` is the bundled
/// implementation; applications with their own persistence implement `Store`.
use crate::errors::StoreError;
use crate::models::{ModelKind, Record};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use uuid::Uuid;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Callback invoked with the updated record after a successful update
pub type MutationHandler = Arc<dyn Fn(Record) -> BoxFuture<'static, ()> + Send + Sync>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Record of `kind` with `id`, or `None` when there is no such row
    async fn fetch_one(&self, kind: &ModelKind, id: Uuid) -> Result<Option<Record>, StoreError>;

    /// Every record of `kind`, in insertion order
    async fn fetch_all(&self, kind: &ModelKind) -> Result<Vec<Record>, StoreError>;

    /// Register a post-update hook for `kind`
    fn on_mutation(&self, kind: ModelKind, handler: MutationHandler);
}
