use async_trait::async_trait;
use sync_capabilities::{CapabilityResult, KeyValueStore};

/// Per-`(table, entityId, field)` last-synced numeric snapshot, used as the
/// `base` value numeric additive merge needs.
#[async_trait]
pub trait ShadowStore: Send + Sync {
 async fn get_base(&self, table: &str, entity_id: &str, field: &str) -> Option<f64>;

 async fn set_base(&self, table: &str, entity_id: &str, field: &str, value: f64);
}

fn shadow_key(prefix: &str, table: &str, entity_id: &str, field: &str) -> String {
 format!("{prefix}_shadow_{table}_{entity_id}_{field}")
}

/// A `ShadowStore` built directly on any `KeyValueStore` capability.
pub struct KvShadowStore<'a> {
 kv: &'a dyn KeyValueStore,
 prefix: String,
}

impl<'a> KvShadowStore<'a> {
 pub fn new(kv: &'a dyn KeyValueStore, prefix: impl Into<String>) -> Self {
 Self {
 kv,
 prefix: prefix.into(),
 }
 }

 async fn read(&self, table: &str, entity_id: &str, field: &str) -> CapabilityResult<Option<f64>> {
 let key = shadow_key(&self.prefix, table, entity_id, field);
 Ok(self.kv.get(&key).await?.and_then(|s| s.parse().ok()))
 }

 async fn write(&self, table: &str, entity_id: &str, field: &str, value: f64) -> CapabilityResult<()> {
 let key = shadow_key(&self.prefix, table, entity_id, field);
 self.kv.set(&key, &value.to_string()).await
 }
}

#[async_trait]
impl<'a> ShadowStore for KvShadowStore<'a> {
 async fn get_base(&self, table: &str, entity_id: &str, field: &str) -> Option<f64> {
 self.read(table, entity_id, field).await.ok().flatten()
 }

 async fn set_base(&self, table: &str, entity_id: &str, field: &str, value: f64) {
 let _ = self.write(table, entity_id, field, value).await;
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use sync_testkit::InMemoryKeyValueStore;

 #[tokio::test]
 async fn unset_base_reads_as_none() {
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 assert_eq!(shadow.get_base("goals", "g1", "current_value").await, None);
 }

 #[tokio::test]
 async fn set_then_get_round_trips() {
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 shadow.set_base("goals", "g1", "current_value", 10.0).await;
 assert_eq!(
 shadow.get_base("goals", "g1", "current_value").await,
 Some(10.0)
 );
 }
}
