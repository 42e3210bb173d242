use crate::{EntityId, UserId};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One row of a configured table, REMOTE+LOCAL.
///
/// The four required attributes (`id`, `updated_at`, `deleted`, `user_id`) are
/// promoted to typed fields; everything else the table declares lives in
/// `fields` as a flat JSON object, since the column set is only known at
/// configuration time.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub user_id: UserId,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub fields: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(id: EntityId, user_id: UserId, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            updated_at,
            deleted: false,
            fields: Map::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Flatten into the wire/storage shape: one JSON object with the four
    /// required attributes alongside the declared columns.
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("id".into(), Value::String(self.id.0.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.0.clone()));
        map.insert(
            "updated_at".into(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        map.insert("deleted".into(), Value::Bool(self.deleted));
        Value::Object(map)
    }

    /// Rebuild from the wire/storage shape, splitting out the required
    /// attributes and leaving the rest in `fields`.
    pub fn from_json(value: Value) -> Option<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            _ => return None,
        };
        let id = map.remove("id")?.as_str()?.to_string();
        let user_id = map.remove("user_id")?.as_str()?.to_string();
        let updated_at = map.remove("updated_at")?;
        let updated_at = updated_at
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))?;
        let deleted = map
            .remove("deleted")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Some(Self {
            id: EntityId(id),
            user_id: UserId(user_id),
            updated_at,
            deleted,
            fields: map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_declared_fields() {
        let mut record = EntityRecord::new(
            EntityId::from("g1"),
            UserId::from("u1"),
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        record.set_field("current_value", json!(10));
        record.set_field("name", json!("alpha"));

        let wire = record.to_json();
        let back = EntityRecord::from_json(wire).expect("round trip");

        assert_eq!(back, record);
    }

    #[test]
    fn from_json_rejects_missing_required_attribute() {
        let value = json!({"id": "g1", "user_id": "u1", "deleted": false});
        assert!(EntityRecord::from_json(value).is_none());
    }
}
