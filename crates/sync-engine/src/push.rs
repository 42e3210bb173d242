//! Push phase of a sync cycle: drains the outbox's
//! coalesced batches in `(table, enqueueId)` order, pushes each group, and
//! removes only the rows a group actually got to acknowledge — a failure
//! partway through must not drop operations the backend never saw.

use chrono::{DateTime, Utc};
use sync_capabilities::{LocalStore, RemoteStore};
use sync_egress::EgressCounters;
use sync_outbox::OutboxQueue;
use sync_realtime::RealtimeManager;
use sync_types::OperationType;
use tracing::{debug, warn};

use crate::error::{classify_capability_error, EngineError, EngineResult, ErrorKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
 pub pushed_groups: usize,
 pub failed_groups: usize,
}

/// Drains and pushes every coalesced outbox group. Returns as soon as a
/// group's failure classifies as an auth error — the caller transitions to
/// the "kicked" state rather than continuing to push against a dead
/// session. A transient failure just bumps that group's retry bookkeeping
/// and moves on to the next group.
pub async fn push_phase(
 local: &dyn LocalStore,
 remote: &dyn RemoteStore,
 outbox: &OutboxQueue,
 egress: &EgressCounters,
 realtime: Option<&RealtimeManager>,
 now: DateTime<Utc>,
) -> EngineResult<PushOutcome> {
 let batches = outbox.coalesced_batches().await;
 let mut outcome = PushOutcome::default();

 for batch in batches {
 if batch.operations.is_empty() {
 // Rule 1: a create+delete pair annihilated with nothing to push.
 outbox.remove_ids(&batch.contributing_ids).await;
 continue;
 }

 let is_delete = batch
 .operations
 .iter()
 .any(|op| op.operation_type == OperationType::Delete);

 let result = if is_delete {
 remote.delete(&batch.table, &batch.entity_id).await
 } else {
 match local.get(&batch.table, &batch.entity_id).await {
 Ok(Some(record)) => {
 egress.record(&batch.table, &record.to_json());
 let pushed = remote.upsert(&batch.table, &record).await;
 if pushed.is_ok() {
 if let Some(manager) = realtime {
 manager
 .record_own_write(&batch.table, &batch.entity_id, record.updated_at)
 .await;
 }
 }
 pushed
 }
 // The row was already deleted locally between enqueue and
 // push; nothing left to push, treat as acknowledged.
 Ok(None) => Ok(()),
 Err(err) => Err(err),
 }
 };

 match result {
 Ok(()) => {
 outbox.remove_ids(&batch.contributing_ids).await;
 outcome.pushed_groups += 1;
 debug!(table = %batch.table, entity_id = %batch.entity_id, "push: group acknowledged");
 }
 Err(err) => match classify_capability_error(&err) {
 ErrorKind::AuthInvalid => return Err(EngineError::AuthKicked),
 ErrorKind::Transient => {
 warn!(table = %batch.table, entity_id = %batch.entity_id, error = %err, "push: group failed, will retry");
 outbox.record_retry(&batch.contributing_ids, now).await;
 outcome.failed_groups += 1;
 }
 },
 }
 }

 Ok(outcome)
}

#[cfg(test)]
mod tests {
 use super::*;
 use sync_testkit::{InMemoryLocalStore, InMemoryRemoteStore};
 use sync_types::{EntityId, EntityRecord, UserId};

 fn record(id: &str) -> EntityRecord {
 let mut r = EntityRecord::new(EntityId::from(id), UserId::from("u1"), Utc::now());
 r.set_field("name", serde_json::json!("alpha"));
 r
 }

 #[tokio::test]
 async fn a_created_row_is_upserted_and_removed_from_the_outbox() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let outbox = OutboxQueue::new();
 let egress = EgressCounters::new(Utc::now());

 local.put("goals", record("g1")).await.unwrap();
 outbox
 .enqueue_create("goals", EntityId::from("g1"), serde_json::json!({}), Utc::now())
 .await;

 let outcome = push_phase(&local, &remote, &outbox, &egress, None, Utc::now()).await.unwrap();
 assert_eq!(outcome.pushed_groups, 1);
 assert!(outbox.is_empty().await);
 assert_eq!(remote.upserts.lock().unwrap().len(), 1);
 }

 #[tokio::test]
 async fn a_deleted_row_calls_remote_delete_without_touching_local_store() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let outbox = OutboxQueue::new();
 let egress = EgressCounters::new(Utc::now());

 outbox.enqueue_delete("goals", EntityId::from("g1"), Utc::now()).await;

 let outcome = push_phase(&local, &remote, &outbox, &egress, None, Utc::now()).await.unwrap();
 assert_eq!(outcome.pushed_groups, 1);
 assert_eq!(remote.deletes.lock().unwrap().len(), 1);
 }

 #[tokio::test]
 async fn annihilated_groups_are_dropped_without_any_remote_call() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let outbox = OutboxQueue::new();
 let egress = EgressCounters::new(Utc::now());

 outbox
 .enqueue_create("goals", EntityId::from("g1"), serde_json::json!({}), Utc::now())
 .await;
 outbox.enqueue_delete("goals", EntityId::from("g1"), Utc::now()).await;

 let outcome = push_phase(&local, &remote, &outbox, &egress, None, Utc::now()).await.unwrap();
 assert_eq!(outcome.pushed_groups, 0);
 assert_eq!(outcome.failed_groups, 0);
 assert!(outbox.is_empty().await);
 assert!(remote.upserts.lock().unwrap().is_empty());
 assert!(remote.deletes.lock().unwrap().is_empty());
 }

 #[tokio::test]
 async fn one_failing_group_does_not_block_the_others() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let outbox = OutboxQueue::new();
 let egress = EgressCounters::new(Utc::now());

 // "missing" has no local row to push for its create — still
 // classified as acknowledged (Ok(None) path) rather than failing.
 local.put("goals", record("present")).await.unwrap();
 outbox
 .enqueue_create("goals", EntityId::from("present"), serde_json::json!({}), Utc::now())
 .await;
 outbox
 .enqueue_create("goals", EntityId::from("missing"), serde_json::json!({}), Utc::now())
 .await;

 let outcome = push_phase(&local, &remote, &outbox, &egress, None, Utc::now()).await.unwrap();
 assert_eq!(outcome.pushed_groups, 2);
 assert!(outbox.is_empty().await);
 }
}
