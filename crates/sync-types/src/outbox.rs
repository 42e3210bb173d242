use crate::EntityId;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// What an outbox row intends to do, not a snapshot of resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
 Increment,
 Set,
 Create,
 Delete,
}

/// One pending intent against a table row.
///
/// Invariants (enforced by the constructors below, not by the type system
/// alone, since `value`'s shape depends on `operation_type`):
/// - `create`/`delete` carry no `field`.
/// - `increment` carries a numeric delta in `value`.
/// - single-field `set` carries `field` plus a scalar `value`.
/// - multi-field `set` omits `field` and carries a key → value map in `value`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutboxItem {
 pub id: i64,
 pub table: String,
 pub entity_id: EntityId,
 pub operation_type: OperationType,
 pub field: Option<String>,
 pub value: Value,
 pub enqueued_at: DateTime<Utc>,
 pub retries: u32,
 pub last_retry_at: Option<DateTime<Utc>>,
}

impl OutboxItem {
 pub fn create(
 id: i64,
 table: impl Into<String>,
 entity_id: EntityId,
 payload: Value,
 now: DateTime<Utc>,
 ) -> Self {
 Self {
 id,
 table: table.into(),
 entity_id,
 operation_type: OperationType::Create,
 field: None,
 value: payload,
 enqueued_at: now,
 retries: 0,
 last_retry_at: None,
 }
 }

 pub fn delete(
 id: i64,
 table: impl Into<String>,
 entity_id: EntityId,
 now: DateTime<Utc>,
 ) -> Self {
 Self {
 id,
 table: table.into(),
 entity_id,
 operation_type: OperationType::Delete,
 field: None,
 value: Value::Null,
 enqueued_at: now,
 retries: 0,
 last_retry_at: None,
 }
 }

 pub fn increment(
 id: i64,
 table: impl Into<String>,
 entity_id: EntityId,
 field: impl Into<String>,
 delta: f64,
 now: DateTime<Utc>,
 ) -> Self {
 Self {
 id,
 table: table.into(),
 entity_id,
 operation_type: OperationType::Increment,
 field: Some(field.into()),
 value: Value::from(delta),
 enqueued_at: now,
 retries: 0,
 last_retry_at: None,
 }
 }

 pub fn set_field(
 id: i64,
 table: impl Into<String>,
 entity_id: EntityId,
 field: impl Into<String>,
 value: Value,
 now: DateTime<Utc>,
 ) -> Self {
 Self {
 id,
 table: table.into(),
 entity_id,
 operation_type: OperationType::Set,
 field: Some(field.into()),
 value,
 enqueued_at: now,
 retries: 0,
 last_retry_at: None,
 }
 }

 pub fn set_many(
 id: i64,
 table: impl Into<String>,
 entity_id: EntityId,
 values: serde_json::Map<String, Value>,
 now: DateTime<Utc>,
 ) -> Self {
 Self {
 id,
 table: table.into(),
 entity_id,
 operation_type: OperationType::Set,
 field: None,
 value: Value::Object(values),
 enqueued_at: now,
 retries: 0,
 last_retry_at: None,
 }
 }

 pub fn is_multi_field_set(&self) -> bool {
 self.operation_type == OperationType::Set && self.field.is_none()
 }
}
