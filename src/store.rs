//! The `ContactStore` collaborator interface: the index backend. The engine
//! only ever talks to this trait; nothing here implements an actual index.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Person;

/// The full-text search index backend.
///
/// All-or-none semantics per call: a batch either fully applies or the
/// engine treats the whole batch as failed (§6).
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn register_schema(&self, force: bool) -> Result<()>;

    /// Upsert by id. Idempotent: re-upserting the same `Person` multiple
    /// times (e.g. across a crash-restart) must be safe.
    async fn upsert(&self, records: Vec<Person>) -> Result<()>;

    async fn delete_by_id(&self, ids: Vec<String>) -> Result<()>;

    async fn list_all_ids(&self, namespace: &str) -> Result<Vec<String>>;
}
