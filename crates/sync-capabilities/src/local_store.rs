use crate::error::CapabilityResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sync_types::{EntityId, EntityRecord};

/// The embedded client-side database: named tables with primary-key CRUD,
/// bulk put, range queries by `updated_at`, compound-keyed delete, and a
/// transactional "clear all user tables" primitive.
#[async_trait]
pub trait LocalStore: Send + Sync {
 /// Awaited before any other method is called. Covers opening the
 /// database and running any pending schema upgrade.
 async fn wait_for_db(&self) -> CapabilityResult<()>;

 async fn get(&self, table: &str, id: &EntityId) -> CapabilityResult<Option<EntityRecord>>;

 async fn put(&self, table: &str, record: EntityRecord) -> CapabilityResult<()>;

 async fn put_many(&self, table: &str, records: Vec<EntityRecord>) -> CapabilityResult<()>;

 /// Delete by `(table, id)` — the compound key every delete goes through,
 /// since the same primary key may exist in several tables.
 async fn delete(&self, table: &str, id: &EntityId) -> CapabilityResult<()>;

 /// Rows with `updated_at >= since`, any order; callers sort.
 async fn range_since(
 &self,
 table: &str,
 since: DateTime<Utc>,
 ) -> CapabilityResult<Vec<EntityRecord>>;

 /// All rows of `table` (used by schema validation's zero-row probe has
 /// its own method; this is the general reader used by diagnostics and
 /// tombstone GC scans).
 async fn all(&self, table: &str) -> CapabilityResult<Vec<EntityRecord>>;

 /// Empties every configured entity table, the outbox, and conflict
 /// history in one local-store transaction. Used by `clearLocalCache`.
 async fn clear_all_user_tables(&self, tables: &[String]) -> CapabilityResult<()>;
}
