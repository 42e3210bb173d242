use chrono::{DateTime, Utc};
use serde_json::Value;
use sync_types::{ConflictHistoryEntry, ConflictWinner, EntityRecord, TableConfig};

use crate::shadow::ShadowStore;

/// Field name used for the tombstone-dominance history entry, since that
/// decision is made once per record rather than per field.
const TOMBSTONE_FIELD: &str = "__deleted__";

/// Resolves one pulled record against the existing local record, per the
/// three-tier policy: tombstone dominance, numeric
/// additive merge (consulting `shadow` for the merge base), then
/// last-write-wins per remaining field. Returns the merged record plus one
/// append-only history entry per non-trivial decision.
///
/// Only called when a local record already exists for the pulled id; a pull
/// with no local counterpart is a plain local insert and never reaches here.
pub async fn resolve(
 local: &EntityRecord,
 remote: &EntityRecord,
 table: &TableConfig,
 shadow: &dyn ShadowStore,
 now: DateTime<Utc>,
) -> (EntityRecord, Vec<ConflictHistoryEntry>) {
 let mut history = Vec::new();

 // Tier 1: tombstone dominance.
 if local.deleted || remote.deleted {
 let winner_side = if local.deleted {
 ConflictWinner::Local
 } else {
 ConflictWinner::Remote
 };
 let winning_record = if local.deleted { local } else { remote };

 history.push(ConflictHistoryEntry {
 entity_id: local.id.clone(),
 entity_type: table.name.clone(),
 field: TOMBSTONE_FIELD.to_string(),
 local_value: Value::Bool(local.deleted),
 remote_value: Value::Bool(remote.deleted),
 resolved_value: Value::Bool(true),
 winner: winner_side,
 strategy: "tombstone_dominance".to_string(),
 timestamp: now,
 });

 return (winning_record.clone(), history);
 }

 let mut merged = local.clone();
 merged.updated_at = remote.updated_at.max(local.updated_at);

 let mut fields: Vec<String> = local
 .fields
 .keys()
 .chain(remote.fields.keys())
 .cloned()
 .collect();
 fields.sort();
 fields.dedup();

 for field in fields {
 if table.is_excluded_from_conflict(&field) {
 continue;
 }

 let local_value = local.fields.get(&field).cloned().unwrap_or(Value::Null);
 let remote_value = remote.fields.get(&field).cloned().unwrap_or(Value::Null);

 if local_value == remote_value {
 continue;
 }

 if table.is_numeric_merge_field(&field) {
 if let Some(entry) = try_numeric_merge(
 &mut merged,
 local,
 remote,
 table,
 &field,
 shadow,
 now,
 &local_value,
 &remote_value,
 )
 .await
 {
 history.push(entry);
 continue;
 }
 // Base unavailable: falls through to LWW below.
 }

 // Tier 3: last-write-wins, ties break toward remote.
 let (resolved_value, winner) = if local.updated_at > remote.updated_at {
 (local_value.clone(), ConflictWinner::Local)
 } else {
 (remote_value.clone(), ConflictWinner::Remote)
 };

 merged.fields.insert(field.clone(), resolved_value.clone());
 history.push(ConflictHistoryEntry {
 entity_id: local.id.clone(),
 entity_type: table.name.clone(),
 field,
 local_value,
 remote_value,
 resolved_value,
 winner,
 strategy: "last_write_wins".to_string(),
 timestamp: now,
 });
 }

 (merged, history)
}

#[allow(clippy::too_many_arguments)]
async fn try_numeric_merge(
 merged: &mut EntityRecord,
 local: &EntityRecord,
 remote: &EntityRecord,
 table: &TableConfig,
 field: &str,
 shadow: &dyn ShadowStore,
 now: DateTime<Utc>,
 local_value: &Value,
 remote_value: &Value,
) -> Option<ConflictHistoryEntry> {
 let local_num = local_value.as_f64()?;
 let remote_num = remote_value.as_f64()?;

 let base = shadow.get_base(&table.name, local.id.as_str(), field).await?;

 // Only a genuine merge if both sides actually diverged from base; a
 // side that didn't change should just take the other side's value.
 let local_changed = (local_num - base).abs() > f64::EPSILON;
 let remote_changed = (remote_num - base).abs() > f64::EPSILON;
 if !(local_changed && remote_changed) {
 return None;
 }

 let resolved = local_num + (remote_num - base);
 let resolved_value = serde_json::Number::from_f64(resolved)
 .map(Value::Number)
 .unwrap_or(Value::Null);

 merged.fields.insert(field.to_string(), resolved_value.clone());
 shadow.set_base(&table.name, local.id.as_str(), field, resolved).await;

 Some(ConflictHistoryEntry {
 entity_id: local.id.clone(),
 entity_type: table.name.clone(),
 field: field.to_string(),
 local_value: local_value.clone(),
 remote_value: remote_value.clone(),
 resolved_value,
 winner: ConflictWinner::Merged,
 strategy: "numeric_additive".to_string(),
 timestamp: now,
 })
}

#[cfg(test)]
mod tests {
 use super::*;
 use serde_json::json;
 use sync_testkit::InMemoryKeyValueStore;
 use sync_types::{EntityId, UserId};

 use crate::shadow::KvShadowStore;

 fn table() -> TableConfig {
 let mut t = TableConfig::new(
 "goals",
 vec![
 "id".into(),
 "updated_at".into(),
 "deleted".into(),
 "user_id".into(),
 "current_value".into(),
 "name".into(),
 "color".into(),
 ],
 );
 t.numeric_merge_fields.push("current_value".into());
 t
 }

 fn record(updated_at: DateTime<Utc>, deleted: bool) -> EntityRecord {
 EntityRecord {
 id: EntityId::from("g1"),
 user_id: UserId::from("u1"),
 updated_at,
 deleted,
 fields: serde_json::Map::new(),
 }
 }

 #[tokio::test]
 async fn tombstone_dominates_regardless_of_timestamp() {
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 let now = Utc::now();

 let mut local = record(now - chrono::Duration::hours(1), true);
 local.set_field("name", json!("alpha"));
 let mut remote = record(now, false);
 remote.set_field("name", json!("beta"));

 let (merged, history) = resolve(&local, &remote, &table, &shadow, now).await;
 assert!(merged.deleted);
 assert_eq!(history.len(), 1);
 assert_eq!(history[0].winner, ConflictWinner::Local);
 }

 #[tokio::test]
 async fn numeric_merge_sums_divergence_from_base() {
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 shadow.set_base("goals", "g1", "current_value", 10.0).await;
 let now = Utc::now();

 let mut local = record(now, false);
 local.set_field("current_value", json!(13));
 let mut remote = record(now, false);
 remote.set_field("current_value", json!(15));

 let (merged, history) = resolve(&local, &remote, &table, &shadow, now).await;
 assert_eq!(merged.field("current_value"), Some(&json!(18.0)));
 assert_eq!(history[0].winner, ConflictWinner::Merged);
 assert_eq!(history[0].strategy, "numeric_additive");
 }

 #[tokio::test]
 async fn numeric_merge_falls_back_to_lww_without_a_base() {
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 let now = Utc::now();
 let later = now + chrono::Duration::seconds(1);

 let mut local = record(now, false);
 local.set_field("current_value", json!(13));
 let mut remote = record(later, false);
 remote.set_field("current_value", json!(15));

 let (merged, history) = resolve(&local, &remote, &table, &shadow, now).await;
 assert_eq!(merged.field("current_value"), Some(&json!(15)));
 assert_eq!(history[0].strategy, "last_write_wins");
 }

 #[tokio::test]
 async fn lww_ties_break_toward_remote() {
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 let now = Utc::now();

 let mut local = record(now, false);
 local.set_field("name", json!("A"));
 let mut remote = record(now, false);
 remote.set_field("name", json!("B"));

 let (merged, history) = resolve(&local, &remote, &table, &shadow, now).await;
 assert_eq!(merged.field("name"), Some(&json!("B")));
 assert_eq!(history[0].winner, ConflictWinner::Remote);
 }

 #[tokio::test]
 async fn excluded_fields_never_generate_history() {
 let mut t = table();
 t.exclude_from_conflict.push("color".into());
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 let now = Utc::now();

 let mut local = record(now, false);
 local.set_field("color", json!("red"));
 let mut remote = record(now, false);
 remote.set_field("color", json!("blue"));

 let (merged, history) = resolve(&local, &remote, &t, &shadow, now).await;
 assert!(history.is_empty());
 assert_eq!(merged.field("color"), Some(&json!("red")));
 }

 #[tokio::test]
 async fn resolution_is_deterministic_for_identical_inputs() {
 let kv = InMemoryKeyValueStore::new();
 let shadow = KvShadowStore::new(&kv, "acme");
 let now = Utc::now();

 let mut local = record(now, false);
 local.set_field("name", json!("A"));
 let mut remote = record(now + chrono::Duration::seconds(1), false);
 remote.set_field("name", json!("B"));

 let (merged_a, history_a) = resolve(&local, &remote, &table, &shadow, now).await;
 let (merged_b, history_b) = resolve(&local, &remote, &table, &shadow, now).await;
 assert_eq!(merged_a, merged_b);
 assert_eq!(history_a, history_b);
 }
}
