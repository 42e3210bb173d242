//! The explicit lock flag: a second singleton row in the single-user config
//! table, keyed `lock_state` rather than `config`, so locking the gate
//! doesn't require touching (or re-deriving) the config row itself.

use serde_json::json;
use sync_auth::SINGLE_USER_CONFIG_TABLE;
use sync_capabilities::{CapabilityResult, LocalStore};
use sync_types::{EntityId, EntityRecord, UserId};

const LOCK_STATE_ID: &str = "lock_state";

pub async fn is_locked(local: &dyn LocalStore) -> CapabilityResult<bool> {
 let record = local.get(SINGLE_USER_CONFIG_TABLE, &EntityId::from(LOCK_STATE_ID)).await?;
 Ok(record
 .and_then(|r| r.fields.get("locked").and_then(|v| v.as_bool()))
 .unwrap_or(false))
}

pub async fn set_locked(local: &dyn LocalStore, owner: UserId, now: chrono::DateTime<chrono::Utc>, locked: bool) -> CapabilityResult<()> {
 let mut record = EntityRecord::new(EntityId::from(LOCK_STATE_ID), owner, now);
 record.set_field("locked", json!(locked));
 local.put(SINGLE_USER_CONFIG_TABLE, record).await
}

#[cfg(test)]
mod tests {
 use super::*;
 use sync_testkit::InMemoryLocalStore;

 #[tokio::test]
 async fn defaults_to_unlocked_when_no_row_present() {
 let local = InMemoryLocalStore::new();
 assert!(!is_locked(&local).await.unwrap());
 }

 #[tokio::test]
 async fn set_locked_round_trips() {
 let local = InMemoryLocalStore::new();
 set_locked(&local, UserId::from("u1"), chrono::Utc::now(), true).await.unwrap();
 assert!(is_locked(&local).await.unwrap());
 }
}
