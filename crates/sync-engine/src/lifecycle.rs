//! Engine startup/shutdown primitives, grounded on `daemon-lifecycle`'s
//! singleton/teardown idiom: explicit, fallible steps rather than an
//! implicit constructor, so a caller can retry a failed start without
//! leaving half-initialized state behind.

use chrono::{DateTime, Utc};
use sync_capabilities::{KeyValueStore, LocalStore};
use sync_outbox::OutboxQueue;
use sync_types::TableConfig;
use tracing::{info, warn};

use crate::cursor::cursor_key;
use crate::error::EngineResult;

/// Reserved local-store table for append-only conflict history rows,
/// alongside the app's own configured tables.
pub const CONFLICT_HISTORY_TABLE: &str = "conflictHistory";

/// Wipes every configured entity table plus the outbox and conflict history
/// in one local-store transaction, drops the persisted cursor, and clears
/// the in-memory outbox mirror. Used when a user signs out or explicitly
/// resets local state.
pub async fn clear_local_cache(
 local: &dyn LocalStore,
 kv: &dyn KeyValueStore,
 outbox: &OutboxQueue,
 tables: &[TableConfig],
 user_id: &sync_types::UserId,
) -> EngineResult<()> {
 let mut table_names: Vec<String> = tables.iter().map(|t| t.name.clone()).collect();
 table_names.push(CONFLICT_HISTORY_TABLE.to_string());

 local.clear_all_user_tables(&table_names).await?;
 outbox.clear().await;
 kv.remove(&cursor_key(user_id)).await?;

 info!(user_id = %user_id, "clearLocalCache: local state wiped");
 Ok(())
}

/// Outbox rows that have exhausted every retry the embedder is willing to
/// wait for are dropped outright rather than retried forever, mirroring
/// `message-sync-retriable-worker`'s `max_retries` ceiling. Distinct from
/// the diagnostics "permanently failing" threshold, which only reports —
/// this one gives up.
pub async fn prune_stale_failures(outbox: &OutboxQueue, hard_ceiling: u32) -> usize {
 let stale = outbox.items_exceeding_retries(hard_ceiling).await;
 if stale.is_empty() {
 return 0;
 }
 let ids: Vec<i64> = stale.iter().map(|item| item.id).collect();
 warn!(count = ids.len(), ceiling = hard_ceiling, "dropping outbox rows past the retry ceiling");
 outbox.remove_ids(&ids).await;
 ids.len()
}

/// Called once a sync cycle's last pass completes, as part of
/// `startSyncEngine`'s single maintenance sweep.
pub async fn run_maintenance_pass(
 local: &dyn LocalStore,
 outbox: &OutboxQueue,
 tables: &[TableConfig],
 tombstone_max_age_days: i64,
 retry_hard_ceiling: u32,
 now: DateTime<Utc>,
) -> EngineResult<()> {
 crate::tombstone::gc_tombstones(local, tables, tombstone_max_age_days, now).await?;
 prune_stale_failures(outbox, retry_hard_ceiling).await;
 Ok(())
}
