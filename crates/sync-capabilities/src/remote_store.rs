use crate::error::CapabilityResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sync_types::{EntityId, EntityRecord, UserId};

/// Filters for a single `RemoteStore::fetch` call. Mirrors the PostgREST
/// query surface: `eq`, `gte`, an optional `lt`, ordered by
/// `updated_at` ascending, with a row limit.
#[derive(Debug, Clone)]
pub struct FetchParams {
 pub table: String,
 pub columns: Vec<String>,
 pub owner: Option<UserId>,
 pub updated_at_gte: Option<DateTime<Utc>>,
 pub updated_at_lt: Option<DateTime<Utc>>,
 pub limit: Option<usize>,
}

impl FetchParams {
 pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
 Self {
 table: table.into(),
 columns,
 owner: None,
 updated_at_gte: None,
 updated_at_lt: None,
 limit: None,
 }
 }

 pub fn with_owner(mut self, owner: UserId) -> Self {
 self.owner = Some(owner);
 self
 }

 pub fn since(mut self, cursor: DateTime<Utc>) -> Self {
 self.updated_at_gte = Some(cursor);
 self
 }
}

/// Abstraction over the relational backend: `GET`-equivalent fetch with
/// filters/projection/order/limit, upsert, delete by id, and scoped RPCs for
/// reset and config lookup.
#[async_trait]
pub trait RemoteStore: Send + Sync {
 async fn fetch(&self, params: FetchParams) -> CapabilityResult<Vec<EntityRecord>>;

 /// Upsert with a natural-key conflict clause where the table declares one.
 async fn upsert(&self, table: &str, record: &EntityRecord) -> CapabilityResult<()>;

 async fn delete(&self, table: &str, id: &EntityId) -> CapabilityResult<()>;

 /// Invokes the `reset` RPC (used when a stored single-user config's
 /// `codeLength` no longer matches the engine configuration).
 async fn rpc_reset(&self, user_id: &UserId) -> CapabilityResult<()>;

 /// Looks up server-side config for the current user/app, used by the
 /// auth-state resolver when validating a stored single-user config.
 async fn rpc_config_lookup(&self, user_id: &UserId) -> CapabilityResult<Option<Value>>;
}
