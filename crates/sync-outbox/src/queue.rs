use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sync_types::{EntityId, OperationType, OutboxItem};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::coalesce::{coalesce_group, CoalescedGroup};

/// The local sync outbox: intent-typed operations awaiting push, grouped and
/// coalesced deterministically at push time.
///
/// Mirrors `daemon_outbox::OutboxQueue`'s shape (in-memory queue behind a
/// `tokio::sync::Mutex`, monotonic ids, retry bookkeeping) generalized from a
/// single FIFO queue to the table/entity-grouped coalescing this spec needs.
pub struct OutboxQueue {
 items: Mutex<Vec<OutboxItem>>,
 next_id: Mutex<i64>,
}

impl Default for OutboxQueue {
 fn default() -> Self {
 Self {
 items: Mutex::new(Vec::new()),
 next_id: Mutex::new(1),
 }
 }
}

impl OutboxQueue {
 pub fn new() -> Self {
 Self::default()
 }

 /// Restores a previously-persisted queue (crash recovery). The caller's
 /// `LocalStore` owns durability; this just seeds the in-memory state.
 pub fn restore(items: Vec<OutboxItem>) -> Self {
 let next_id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
 Self {
 items: Mutex::new(items),
 next_id: Mutex::new(next_id),
 }
 }

 async fn allocate_id(&self) -> i64 {
 let mut next_id = self.next_id.lock().await;
 let id = *next_id;
 *next_id += 1;
 id
 }

 pub async fn enqueue_create(
 &self,
 table: impl Into<String>,
 entity_id: EntityId,
 payload: serde_json::Value,
 now: DateTime<Utc>,
 ) -> OutboxItem {
 let id = self.allocate_id().await;
 let item = OutboxItem::create(id, table, entity_id, payload, now);
 self.push(item.clone()).await;
 item
 }

 pub async fn enqueue_delete(
 &self,
 table: impl Into<String>,
 entity_id: EntityId,
 now: DateTime<Utc>,
 ) -> OutboxItem {
 let id = self.allocate_id().await;
 let item = OutboxItem::delete(id, table, entity_id, now);
 self.push(item.clone()).await;
 item
 }

 pub async fn enqueue_increment(
 &self,
 table: impl Into<String>,
 entity_id: EntityId,
 field: impl Into<String>,
 delta: f64,
 now: DateTime<Utc>,
 ) -> OutboxItem {
 let id = self.allocate_id().await;
 let item = OutboxItem::increment(id, table, entity_id, field, delta, now);
 self.push(item.clone()).await;
 item
 }

 pub async fn enqueue_set(
 &self,
 table: impl Into<String>,
 entity_id: EntityId,
 field: impl Into<String>,
 value: serde_json::Value,
 now: DateTime<Utc>,
 ) -> OutboxItem {
 let id = self.allocate_id().await;
 let item = OutboxItem::set_field(id, table, entity_id, field, value, now);
 self.push(item.clone()).await;
 item
 }

 async fn push(&self, item: OutboxItem) {
 debug!(table = %item.table, entity_id = %item.entity_id, op = ?item.operation_type, "outbox: enqueued");
 self.items.lock().await.push(item);
 }

 pub async fn pending_count(&self) -> usize {
 self.items.lock().await.len()
 }

 pub async fn is_empty(&self) -> bool {
 self.pending_count().await == 0
 }

 /// Entity ids with a pending outbox row, feeding the pull phase's
 /// recently-modified guard.
 pub async fn pending_entity_ids(&self) -> HashSet<EntityId> {
 self.items
 .lock()
 .await
 .iter()
 .map(|i| i.entity_id.clone())
 .collect()
 }

 pub async fn counts_by_table(&self) -> HashMap<String, usize> {
 let items = self.items.lock().await;
 let mut counts = HashMap::new();
 for item in items.iter() {
 *counts.entry(item.table.clone()).or_insert(0) += 1;
 }
 counts
 }

 pub async fn counts_by_operation_type(&self) -> HashMap<OperationType, usize> {
 let items = self.items.lock().await;
 let mut counts = HashMap::new();
 for item in items.iter() {
 *counts.entry(item.operation_type).or_insert(0) += 1;
 }
 counts
 }

 /// Groups all pending items by `(table, entityId)` in ascending enqueue
 /// order, coalesces each group, and returns the push-ready batches. Empty
 /// groups (annihilated by rule 1) are included with zero operations so
 /// the caller can still drop their `contributing_ids`.
 pub async fn coalesced_batches(&self) -> Vec<CoalescedGroup> {
 let items = self.items.lock().await;
 let mut groups: HashMap<(String, EntityId), Vec<OutboxItem>> = HashMap::new();
 for item in items.iter() {
 groups
 .entry((item.table.clone(), item.entity_id.clone()))
 .or_default()
 .push(item.clone());
 }

 let mut keys: Vec<_> = groups.keys().cloned().collect();
 // Order groups by the smallest enqueue id they contain, so push
 // order across groups is still determined by total arrival order.
 keys.sort_by_key(|key| groups[key].iter().map(|i| i.id).min().unwrap_or(i64::MAX));

 keys.into_iter()
 .map(|key| coalesce_group(groups.remove(&key).unwrap()))
 .collect()
 }

 /// Removes the given row ids after a successful (or partially
 /// successful) push. Called with one group's `contributing_ids` at a
 /// time so a table failure mid-push only drops the rows that were
 /// actually acknowledged.
 pub async fn remove_ids(&self, ids: &[i64]) {
 let mut items = self.items.lock().await;
 items.retain(|i| !ids.contains(&i.id));
 }

 /// Bumps `retries`/`last_retry_at` on the given ids after a failed push,
 /// retry bookkeeping.
 pub async fn record_retry(&self, ids: &[i64], now: DateTime<Utc>) {
 let mut items = self.items.lock().await;
 for item in items.iter_mut() {
 if ids.contains(&item.id) {
 item.retries += 1;
 item.last_retry_at = Some(now);
 }
 }
 if !ids.is_empty() {
 warn!(count = ids.len(), "outbox: push failed, retry bookkeeping updated");
 }
 }

 /// Rows whose retry count exceeds `threshold`, surfaced to diagnostics
 /// as permanently-failing.
 pub async fn items_exceeding_retries(&self, threshold: u32) -> Vec<OutboxItem> {
 self.items
 .lock()
 .await
 .iter()
 .filter(|i| i.retries > threshold)
 .cloned()
 .collect()
 }

 /// Snapshot of every pending item, oldest first. Used by diagnostics and
 /// by tests asserting on raw queue contents.
 pub async fn snapshot(&self) -> Vec<OutboxItem> {
 let mut items = self.items.lock().await.clone();
 items.sort_by_key(|i| i.id);
 items
 }

 /// Drops every pending item, used by `clearLocalCache`.
 pub async fn clear(&self) {
 self.items.lock().await.clear();
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use chrono::Utc;

 #[tokio::test]
 async fn enqueue_assigns_monotonic_ids() {
 let queue = OutboxQueue::new();
 let a = queue
 .enqueue_create("goals", EntityId::from("g1"), serde_json::json!({}), Utc::now())
 .await;
 let b = queue
 .enqueue_set("goals", EntityId::from("g1"), "name", serde_json::json!("x"), Utc::now())
 .await;
 assert!(b.id > a.id);
 }

 #[tokio::test]
 async fn coalesced_batches_group_by_table_and_entity() {
 let queue = OutboxQueue::new();
 queue
 .enqueue_increment("goals", EntityId::from("g1"), "current_value", 1.0, Utc::now())
 .await;
 queue
 .enqueue_increment("goals", EntityId::from("g1"), "current_value", 1.0, Utc::now())
 .await;
 queue
 .enqueue_set("notes", EntityId::from("n1"), "title", serde_json::json!("hi"), Utc::now())
 .await;

 let batches = queue.coalesced_batches().await;
 assert_eq!(batches.len(), 2);
 let goals = batches.iter().find(|b| b.table == "goals").unwrap();
 assert_eq!(goals.operations.len(), 1);
 assert_eq!(goals.operations[0].value.as_f64(), Some(2.0));
 }

 #[tokio::test]
 async fn remove_ids_drops_only_the_given_rows() {
 let queue = OutboxQueue::new();
 let a = queue
 .enqueue_set("goals", EntityId::from("g1"), "name", serde_json::json!("a"), Utc::now())
 .await;
 let _b = queue
 .enqueue_set("goals", EntityId::from("g2"), "name", serde_json::json!("b"), Utc::now())
 .await;

 queue.remove_ids(&[a.id]).await;
 let remaining = queue.snapshot().await;
 assert_eq!(remaining.len(), 1);
 assert_eq!(remaining[0].entity_id, EntityId::from("g2"));
 }

 #[tokio::test]
 async fn record_retry_increments_count_and_timestamp() {
 let queue = OutboxQueue::new();
 let item = queue
 .enqueue_set("goals", EntityId::from("g1"), "name", serde_json::json!("a"), Utc::now())
 .await;

 let now = Utc::now();
 queue.record_retry(&[item.id], now).await;
 let snapshot = queue.snapshot().await;
 assert_eq!(snapshot[0].retries, 1);
 assert_eq!(snapshot[0].last_retry_at, Some(now));
 }

 #[tokio::test]
 async fn restore_seeds_next_id_past_the_max_existing() {
 let seeded = vec![OutboxItem::create(
 7,
 "goals",
 EntityId::from("g1"),
 serde_json::json!({}),
 Utc::now(),
 )];
 let queue = OutboxQueue::restore(seeded);
 let next = queue
 .enqueue_delete("goals", EntityId::from("g1"), Utc::now())
 .await;
 assert_eq!(next.id, 8);
 }

 #[tokio::test]
 async fn empty_queue_coalesces_to_no_batches() {
 let queue = OutboxQueue::new();
 assert!(queue.coalesced_batches().await.is_empty());
 }
}
