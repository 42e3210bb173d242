//! Pull phase of a sync cycle: fetches rows updated
//! since the cursor, ascending, projected to each table's declared columns;
//! skips anything guarded by the recently-modified index or still pending
//! in the outbox; otherwise merges against the existing local row (or
//! inserts it outright) and advances the cursor only once every table has
//! succeeded.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sync_capabilities::{FetchParams, KeyValueStore, LocalStore, RemoteStore};
use sync_conflict::KvShadowStore;
use sync_egress::EgressCounters;
use sync_types::{ConflictHistoryEntry, EntityId, SyncCursor, TableConfig, UserId};

use crate::error::EngineResult;
use crate::recently_modified::RecentlyModifiedGuard;

#[derive(Debug, Clone, Default)]
pub struct PullOutcome {
 pub cursor: SyncCursor,
 pub history: Vec<ConflictHistoryEntry>,
 pub rows_applied: usize,
}

/// Pulls every configured table. `pending_entity_ids` is the outbox's
/// current in-flight set, so a row this client is about to push isn't
/// immediately overwritten by a remote copy that predates it.
#[allow(clippy::too_many_arguments)]
pub async fn pull_phase(
 local: &dyn LocalStore,
 remote: &dyn RemoteStore,
 shadow_kv: &dyn KeyValueStore,
 shadow_prefix: &str,
 tables: &[TableConfig],
 owner: &UserId,
 cursor: SyncCursor,
 recently_modified: &RecentlyModifiedGuard,
 pending_entity_ids: &HashSet<EntityId>,
 egress: &EgressCounters,
 now: DateTime<Utc>,
) -> EngineResult<PullOutcome> {
 let shadow = KvShadowStore::new(shadow_kv, shadow_prefix);
 let mut max_seen: Option<DateTime<Utc>> = None;
 let mut history = Vec::new();
 let mut rows_applied = 0;

 for table in tables {
 let params = FetchParams::new(table.name.clone(), table.columns.clone())
 .with_owner(owner.clone())
 .since(cursor.timestamp());

 // Propagated via `EngineError::Capability`'s `#[from]`; any failure
 // here — including a partial fetch after earlier tables succeeded
 // — aborts the whole pull without touching the cursor.
 let rows = remote.fetch(params).await?;

 for remote_record in rows {
 egress.record(&table.name, &remote_record.to_json());
 max_seen = Some(match max_seen {
 Some(seen) if seen >= remote_record.updated_at => seen,
 _ => remote_record.updated_at,
 });

 if pending_entity_ids.contains(&remote_record.id)
 || recently_modified.is_recently_modified(&table.name, &remote_record.id, now)
 {
 continue;
 }

 match local.get(&table.name, &remote_record.id).await? {
 Some(local_record) => {
 let (merged, entries) =
 sync_conflict::resolve(&local_record, &remote_record, table, &shadow, now).await;
 local.put(&table.name, merged).await?;
 history.extend(entries);
 }
 None => {
 local.put(&table.name, remote_record).await?;
 }
 }
 rows_applied += 1;
 }
 }

 let mut advanced = cursor;
 if let Some(seen) = max_seen {
 advanced.advance(seen);
 }

 Ok(PullOutcome {
 cursor: advanced,
 history,
 rows_applied,
 })
}
