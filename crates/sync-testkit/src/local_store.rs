use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sync_capabilities::{CapabilityResult, LocalStore};
use sync_types::{EntityId, EntityRecord};

/// An in-memory `LocalStore`, analogous to `daemon_database::Database::open_in_memory`
/// in the teacher workspace: every engine/crate test seeds one of these
/// instead of standing up a real embedded database.
#[derive(Default)]
pub struct InMemoryLocalStore {
 tables: Mutex<HashMap<String, HashMap<String, EntityRecord>>>,
}

impl InMemoryLocalStore {
 pub fn new() -> Self {
 Self::default()
 }

 /// Test helper: seed a row directly, bypassing the trait's async surface.
 pub fn seed(&self, table: &str, record: EntityRecord) {
 let mut tables = self.tables.lock().unwrap();
 tables
 .entry(table.to_string())
 .or_default()
 .insert(record.id.0.clone(), record);
 }
}

#[async_trait]
impl LocalStore for InMemoryLocalStore {
 async fn wait_for_db(&self) -> CapabilityResult<()> {
 Ok(())
 }

 async fn get(&self, table: &str, id: &EntityId) -> CapabilityResult<Option<EntityRecord>> {
 let tables = self.tables.lock().unwrap();
 Ok(tables.get(table).and_then(|rows| rows.get(&id.0)).cloned())
 }

 async fn put(&self, table: &str, record: EntityRecord) -> CapabilityResult<()> {
 let mut tables = self.tables.lock().unwrap();
 tables
 .entry(table.to_string())
 .or_default()
 .insert(record.id.0.clone(), record);
 Ok(())
 }

 async fn put_many(&self, table: &str, records: Vec<EntityRecord>) -> CapabilityResult<()> {
 let mut tables = self.tables.lock().unwrap();
 let rows = tables.entry(table.to_string()).or_default();
 for record in records {
 rows.insert(record.id.0.clone(), record);
 }
 Ok(())
 }

 async fn delete(&self, table: &str, id: &EntityId) -> CapabilityResult<()> {
 let mut tables = self.tables.lock().unwrap();
 if let Some(rows) = tables.get_mut(table) {
 rows.remove(&id.0);
 }
 Ok(())
 }

 async fn range_since(
 &self,
 table: &str,
 since: DateTime<Utc>,
 ) -> CapabilityResult<Vec<EntityRecord>> {
 let tables = self.tables.lock().unwrap();
 Ok(tables
 .get(table)
 .map(|rows| {
 rows.values()
 .filter(|r| r.updated_at >= since)
 .cloned()
 .collect()
 })
 .unwrap_or_default())
 }

 async fn all(&self, table: &str) -> CapabilityResult<Vec<EntityRecord>> {
 let tables = self.tables.lock().unwrap();
 Ok(tables
 .get(table)
 .map(|rows| rows.values().cloned().collect())
 .unwrap_or_default())
 }

 async fn clear_all_user_tables(&self, tables: &[String]) -> CapabilityResult<()> {
 let mut guard = self.tables.lock().unwrap();
 for table in tables {
 guard.remove(table);
 }
 Ok(())
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use sync_types::UserId;

 fn record(id: &str, updated_at: DateTime<Utc>) -> EntityRecord {
 EntityRecord::new(EntityId::from(id), UserId::from("u1"), updated_at)
 }

 #[tokio::test]
 async fn put_then_get_round_trips() {
 let store = InMemoryLocalStore::new();
 let r = record("g1", Utc::now());
 store.put("goals", r.clone()).await.unwrap();

 let got = store.get("goals", &EntityId::from("g1")).await.unwrap();
 assert_eq!(got, Some(r));
 }

 #[tokio::test]
 async fn range_since_filters_by_updated_at() {
 let store = InMemoryLocalStore::new();
 let old = Utc::now() - chrono::Duration::days(1);
 let new = Utc::now();
 store.put("goals", record("old", old)).await.unwrap();
 store.put("goals", record("new", new)).await.unwrap();

 let cutoff = Utc::now() - chrono::Duration::hours(1);
 let rows = store.range_since("goals", cutoff).await.unwrap();
 assert_eq!(rows.len(), 1);
 assert_eq!(rows[0].id, EntityId::from("new"));
 }

 #[tokio::test]
 async fn clear_all_user_tables_empties_named_tables_only() {
 let store = InMemoryLocalStore::new();
 store.put("goals", record("g1", Utc::now())).await.unwrap();
 store.put("notes", record("n1", Utc::now())).await.unwrap();

 store
 .clear_all_user_tables(&["goals".to_string()])
 .await
 .unwrap();

 assert!(store.all("goals").await.unwrap().is_empty());
 assert_eq!(store.all("notes").await.unwrap().len(), 1);
 }
}
