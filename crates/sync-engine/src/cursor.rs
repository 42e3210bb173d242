//! Per-user pull cursor persistence.
//! The cursor itself only ever moves forward (`SyncCursor::advance`); this
//! module just knows where it lives in the key-value store.

use chrono::{DateTime, Utc};
use sync_capabilities::{CapabilityResult, KeyValueStore};
use sync_types::{SyncCursor, UserId};

pub(crate) fn cursor_key(user_id: &UserId) -> String {
    format!("lastSyncCursor_{}", user_id.as_str())
}

/// Loads the stored cursor, defaulting to the epoch for a user who has
/// never completed a successful pull.
pub async fn load_cursor(kv: &dyn KeyValueStore, user_id: &UserId) -> CapabilityResult<SyncCursor> {
    let key = cursor_key(user_id);
    let stored = kv.get(&key).await?;
    Ok(stored
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| SyncCursor(dt.with_timezone(&Utc)))
        .unwrap_or_else(SyncCursor::epoch))
}

pub async fn save_cursor(
    kv: &dyn KeyValueStore,
    user_id: &UserId,
    cursor: SyncCursor,
) -> CapabilityResult<()> {
    kv.set(&cursor_key(user_id), &cursor.timestamp().to_rfc3339()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_testkit::InMemoryKeyValueStore;

    #[tokio::test]
    async fn missing_cursor_defaults_to_epoch() {
        let kv = InMemoryKeyValueStore::new();
        let cursor = load_cursor(&kv, &UserId::from("u1")).await.unwrap();
        assert_eq!(cursor, SyncCursor::epoch());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let kv = InMemoryKeyValueStore::new();
        let now = Utc::now();
        save_cursor(&kv, &UserId::from("u1"), SyncCursor(now)).await.unwrap();

        let loaded = load_cursor(&kv, &UserId::from("u1")).await.unwrap();
        // RFC3339 round-trips to millisecond precision.
        assert_eq!(loaded.timestamp().timestamp_millis(), now.timestamp_millis());
    }

    #[tokio::test]
    async fn cursors_for_different_users_do_not_collide() {
        let kv = InMemoryKeyValueStore::new();
        save_cursor(&kv, &UserId::from("u1"), SyncCursor(Utc::now())).await.unwrap();

        let loaded = load_cursor(&kv, &UserId::from("u2")).await.unwrap();
        assert_eq!(loaded, SyncCursor::epoch());
    }
}
