use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use sync_capabilities::{CapabilityError, CapabilityResult, FetchParams, RemoteStore};
use sync_types::{EntityId, EntityRecord, UserId};

/// An in-memory `RemoteStore` standing in for the PostgREST-style backend.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    tables: Mutex<HashMap<String, HashMap<String, EntityRecord>>>,
    /// Requests recorded for assertions in tests (push/pull call counts).
    pub upserts: Mutex<Vec<(String, EntityRecord)>>,
    pub deletes: Mutex<Vec<(String, EntityId)>>,
    pub reset_calls: Mutex<Vec<UserId>>,
    /// Set by `fail_next_fetch` so the next `fetch` call (only) returns this
    /// error message instead of reading `tables` — for exercising schema
    /// probe and pull-phase error handling without a real backend.
    next_fetch_failure: Mutex<Option<String>>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, record: EntityRecord) {
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table.to_string())
            .or_default()
            .insert(record.id.0.clone(), record);
    }

    /// Arranges for the next call to `fetch` to fail with `message` instead
    /// of returning rows.
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        *self.next_fetch_failure.lock().unwrap() = Some(message.into());
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch(&self, params: FetchParams) -> CapabilityResult<Vec<EntityRecord>> {
        if let Some(message) = self.next_fetch_failure.lock().unwrap().take() {
            return Err(CapabilityError::RemoteStore(message));
        }

        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<EntityRecord> = tables
            .get(&params.table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();

        if let Some(owner) = &params.owner {
            rows.retain(|r| &r.user_id == owner);
        }
        if let Some(since) = params.updated_at_gte {
            rows.retain(|r| r.updated_at >= since);
        }
        if let Some(before) = params.updated_at_lt {
            rows.retain(|r| r.updated_at < before);
        }
        rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.0.cmp(&b.id.0)));
        if let Some(limit) = params.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn upsert(&self, table: &str, record: &EntityRecord) -> CapabilityResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table.to_string())
            .or_default()
            .insert(record.id.0.clone(), record.clone());
        drop(tables);
        self.upserts
            .lock()
            .unwrap()
            .push((table.to_string(), record.clone()));
        Ok(())
    }

    async fn delete(&self, table: &str, id: &EntityId) -> CapabilityResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            rows.remove(&id.0);
        }
        drop(tables);
        self.deletes
            .lock()
            .unwrap()
            .push((table.to_string(), id.clone()));
        Ok(())
    }

    async fn rpc_reset(&self, user_id: &UserId) -> CapabilityResult<()> {
        self.reset_calls.lock().unwrap().push(user_id.clone());
        Ok(())
    }

    async fn rpc_config_lookup(&self, _user_id: &UserId) -> CapabilityResult<Option<Value>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn fetch_applies_owner_and_cursor_filters() {
        let store = InMemoryRemoteStore::new();
        let mut r1 = EntityRecord::new(EntityId::from("g1"), UserId::from("u1"), Utc::now());
        r1.set_field("current_value", serde_json::json!(1));
        store.seed("goals", r1);

        let params = FetchParams::new("goals", vec!["id".into()]).with_owner(UserId::from("u2"));
        let rows = store.fetch(params).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn upsert_records_call_for_assertions() {
        let store = InMemoryRemoteStore::new();
        let r = EntityRecord::new(EntityId::from("g1"), UserId::from("u1"), Utc::now());
        store.upsert("goals", &r).await.unwrap();
        assert_eq!(store.upserts.lock().unwrap().len(), 1);
    }
}
