use serde_json::{Map, Value};
use sync_types::{EntityId, OperationType, OutboxItem};

/// The deterministic reduction of one `(table, entityId)` group, ready to
/// push. `operations` holds zero items (create+delete annihilation), one
/// item (delete, or create-with-folded-sets/increments), or several items
/// (rule 4: one summed increment per field plus one combined multi-field
/// set)
#[derive(Debug, Clone, PartialEq)]
pub struct CoalescedGroup {
 pub table: String,
 pub entity_id: EntityId,
 pub operations: Vec<OutboxItem>,
 /// Source row ids folded into `operations`, in enqueue order. Removed
 /// atomically from the outbox on a successful push of this group.
 pub contributing_ids: Vec<i64>,
}

/// Reduces one group's operations per the four ordered rules in the design
/// §4.4. `items` need not be pre-sorted; this function sorts by enqueue id
/// to establish the group's total order before applying the rules.
pub fn coalesce_group(mut items: Vec<OutboxItem>) -> CoalescedGroup {
 items.sort_by_key(|item| item.id);

 let table = items[0].table.clone();
 let entity_id = items[0].entity_id.clone();
 let contributing_ids: Vec<i64> = items.iter().map(|i| i.id).collect();
 let last_enqueued_at = items.last().expect("non-empty group").enqueued_at;
 let last_id = *contributing_ids.last().expect("non-empty group");

 let has_delete = items
 .iter()
 .any(|i| i.operation_type == OperationType::Delete);
 let has_create = items
 .iter()
 .any(|i| i.operation_type == OperationType::Create);

 let operations = if has_delete && has_create {
 // Rule 1: create+delete annihilate, with no remote trace.
 Vec::new()
 } else if has_delete {
 // Rule 2: any delete collapses the whole group to one delete.
 vec![OutboxItem::delete(
 last_id,
 table.clone(),
 entity_id.clone(),
 last_enqueued_at,
 )]
 } else if has_create {
 // Rule 3: fold every subsequent set/increment into the create payload.
 vec![fold_into_create(&items, &table, &entity_id, last_id, last_enqueued_at)]
 } else {
 // Rule 4: increments sum per field, sets combine into one multi-field set.
 fold_plain_sets_and_increments(&items, &table, &entity_id, last_id, last_enqueued_at)
 };

 CoalescedGroup {
 table,
 entity_id,
 operations,
 contributing_ids,
 }
}

fn fold_into_create(
 items: &[OutboxItem],
 table: &str,
 entity_id: &EntityId,
 id: i64,
 now: chrono::DateTime<chrono::Utc>,
) -> OutboxItem {
 let create_item = items
 .iter()
 .find(|i| i.operation_type == OperationType::Create)
 .expect("has_create checked by caller");

 let mut payload: Map<String, Value> = match &create_item.value {
 Value::Object(map) => map.clone(),
 _ => Map::new(),
 };

 for item in items.iter().filter(|i| i.id > create_item.id) {
 match item.operation_type {
 OperationType::Set => apply_set(&mut payload, item),
 OperationType::Increment => apply_increment(&mut payload, item),
 OperationType::Create | OperationType::Delete => {}
 }
 }

 OutboxItem::create(id, table, entity_id.clone(), Value::Object(payload), now)
}

fn apply_set(payload: &mut Map<String, Value>, item: &OutboxItem) {
 match (&item.field, &item.value) {
 (Some(field), value) => {
 payload.insert(field.clone(), value.clone());
 }
 (None, Value::Object(fields)) => {
 for (k, v) in fields {
 payload.insert(k.clone(), v.clone());
 }
 }
 (None, _) => {}
 }
}

fn apply_increment(payload: &mut Map<String, Value>, item: &OutboxItem) {
 let Some(field) = &item.field else { return };
 let delta = item.value.as_f64().unwrap_or(0.0);
 let current = payload.get(field).and_then(Value::as_f64).unwrap_or(0.0);
 payload.insert(field.clone(), json_number(current + delta));
}

fn fold_plain_sets_and_increments(
 items: &[OutboxItem],
 table: &str,
 entity_id: &EntityId,
 id: i64,
 now: chrono::DateTime<chrono::Utc>,
) -> Vec<OutboxItem> {
 let mut increment_sums: Vec<(String, f64)> = Vec::new();
 let mut set_values: Map<String, Value> = Map::new();

 for item in items {
 match item.operation_type {
 OperationType::Increment => {
 let Some(field) = &item.field else { continue };
 let delta = item.value.as_f64().unwrap_or(0.0);
 if let Some(entry) = increment_sums.iter_mut().find(|(f, _)| f == field) {
 entry.1 += delta;
 } else {
 increment_sums.push((field.clone(), delta));
 }
 }
 OperationType::Set => apply_set(&mut set_values, item),
 OperationType::Create | OperationType::Delete => {}
 }
 }

 let mut operations = Vec::new();
 for (field, total) in increment_sums {
 operations.push(OutboxItem::increment(
 id,
 table,
 entity_id.clone(),
 field,
 total,
 now,
 ));
 }
 if !set_values.is_empty() {
 operations.push(OutboxItem::set_many(id, table, entity_id.clone(), set_values, now));
 }
 operations
}

fn json_number(value: f64) -> Value {
 serde_json::Number::from_f64(value)
 .map(Value::Number)
 .unwrap_or(Value::Null)
}
