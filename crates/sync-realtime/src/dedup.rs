use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use sync_types::EntityId;

const DEFAULT_CAPACITY: usize = 256;

/// Identifies one change for dedup purposes: which table, which row, and
/// the `updated_at` stamped on it. Two pushes of the same row at different
/// timestamps are distinct entries — only an exact echo is suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
 table: String,
 id: String,
 updated_at_millis: i64,
}

/// Small fixed-capacity ring of recently-processed `(table, id, updated_at)`
/// triples, used to suppress self-echo: realtime delivers back a change
/// this client just pushed, and without dedup the engine would re-feed its
/// own write through the conflict resolver.
pub struct DedupRing {
 capacity: usize,
 order: VecDeque<DedupKey>,
}

impl DedupRing {
 pub fn new(capacity: usize) -> Self {
 Self {
 capacity: capacity.max(1),
 order: VecDeque::with_capacity(capacity),
 }
 }

 /// `true` if `(table, id, updated_at)` was already recorded.
 pub fn contains(&self, table: &str, id: &EntityId, updated_at: DateTime<Utc>) -> bool {
 let key = DedupKey {
 table: table.to_string(),
 id: id.0.clone(),
 updated_at_millis: updated_at.timestamp_millis(),
 };
 self.order.contains(&key)
 }

 /// Records a triple, evicting the oldest entry once at capacity.
 pub fn record(&mut self, table: &str, id: &EntityId, updated_at: DateTime<Utc>) {
 let key = DedupKey {
 table: table.to_string(),
 id: id.0.clone(),
 updated_at_millis: updated_at.timestamp_millis(),
 };
 if self.order.contains(&key) {
 return;
 }
 if self.order.len() >= self.capacity {
 self.order.pop_front();
 }
 self.order.push_back(key);
 }
}

impl Default for DedupRing {
 fn default() -> Self {
 Self::new(DEFAULT_CAPACITY)
 }
}

#[cfg(test)]
mod tests {
 use super::*;

 #[test]
 fn records_and_detects_duplicate_triples() {
 let mut ring = DedupRing::new(8);
 let now = Utc::now();
 ring.record("goals", &EntityId::from("g1"), now);

 assert!(ring.contains("goals", &EntityId::from("g1"), now));
 assert!(!ring.contains("goals", &EntityId::from("g2"), now));
 }

 #[test]
 fn distinct_timestamps_on_same_row_are_not_deduped() {
 let mut ring = DedupRing::new(8);
 let t1 = Utc::now();
 let t2 = t1 + chrono::Duration::seconds(1);
 ring.record("goals", &EntityId::from("g1"), t1);

 assert!(!ring.contains("goals", &EntityId::from("g1"), t2));
 }

 #[test]
 fn oldest_entry_is_evicted_once_capacity_is_reached() {
 let mut ring = DedupRing::new(2);
 let now = Utc::now();
 ring.record("goals", &EntityId::from("g1"), now);
 ring.record("goals", &EntityId::from("g2"), now);
 ring.record("goals", &EntityId::from("g3"), now);

 assert!(!ring.contains("goals", &EntityId::from("g1"), now));
 assert!(ring.contains("goals", &EntityId::from("g2"), now));
 assert!(ring.contains("goals", &EntityId::from("g3"), now));
 }

 #[test]
 fn re_recording_an_existing_entry_does_not_duplicate_or_evict() {
 let mut ring = DedupRing::new(2);
 let now = Utc::now();
 ring.record("goals", &EntityId::from("g1"), now);
 ring.record("goals", &EntityId::from("g2"), now);
 ring.record("goals", &EntityId::from("g1"), now);

 assert!(ring.contains("goals", &EntityId::from("g1"), now));
 assert!(ring.contains("goals", &EntityId::from("g2"), now));
 }
}
