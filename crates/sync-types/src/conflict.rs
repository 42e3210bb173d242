use crate::EntityId;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Which side a field-level conflict resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictWinner {
 Local,
 Remote,
 Merged,
}

/// One append-only record of a non-trivial conflict decision.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConflictHistoryEntry {
 pub entity_id: EntityId,
 pub entity_type: String,
 pub field: String,
 pub local_value: Value,
 pub remote_value: Value,
 pub resolved_value: Value,
 pub winner: ConflictWinner,
 pub strategy: String,
 pub timestamp: DateTime<Utc>,
}
