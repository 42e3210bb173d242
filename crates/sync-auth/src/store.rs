//! Local persistence for the three singleton auth tables: offline credentials, the offline session, and
//! the single-user config. Each is a one-row `LocalStore` table keyed by a
//! fixed id, encoded as an [`EntityRecord`] so it goes through the same
//! storage primitive as ordinary synced data.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sync_capabilities::LocalStore;
use sync_types::{EntityId, EntityRecord, GateType, OfflineCredentials, OfflineSession, SingleUserConfig, UserId};

use crate::error::{AuthError, AuthResult};

pub const OFFLINE_CREDENTIALS_TABLE: &str = "offline_credentials";
pub const OFFLINE_CREDENTIALS_ID: &str = "current_user";

pub const OFFLINE_SESSION_TABLE: &str = "offline_session";
pub const OFFLINE_SESSION_ID: &str = "current_session";

pub const SINGLE_USER_CONFIG_TABLE: &str = "single_user_config";
pub const SINGLE_USER_CONFIG_ID: &str = "config";

/// Placeholder owner for tables that are local singletons rather than
/// per-remote-user rows; `LocalStore::get`/`put` still require a `user_id`
/// to route to the right partition in embedders that shard by user.
fn local_owner() -> UserId {
 UserId::from("local")
}

pub async fn load_offline_credentials(
 local: &dyn LocalStore,
) -> AuthResult<Option<OfflineCredentials>> {
 let record = local
 .get(OFFLINE_CREDENTIALS_TABLE, &EntityId::from(OFFLINE_CREDENTIALS_ID))
 .await?;
 record.map(record_to_credentials).transpose()
}

pub async fn save_offline_credentials(
 local: &dyn LocalStore,
 creds: &OfflineCredentials,
) -> AuthResult<()> {
 local
 .put(OFFLINE_CREDENTIALS_TABLE, credentials_to_record(creds))
 .await?;
 Ok(())
}

pub async fn load_offline_session(local: &dyn LocalStore) -> AuthResult<Option<OfflineSession>> {
 let record = local
 .get(OFFLINE_SESSION_TABLE, &EntityId::from(OFFLINE_SESSION_ID))
 .await?;
 record.map(record_to_session).transpose()
}

pub async fn save_offline_session(local: &dyn LocalStore, session: &OfflineSession) -> AuthResult<()> {
 local.put(OFFLINE_SESSION_TABLE, session_to_record(session)).await?;
 Ok(())
}

/// Sign-out clears both the offline session and credentials; per the design
/// §3.5 they are never cleared by errors while offline, only by explicit
/// logout or a fresh authoritative sign-in.
pub async fn clear_offline_state(local: &dyn LocalStore) -> AuthResult<()> {
 local
 .delete(OFFLINE_SESSION_TABLE, &EntityId::from(OFFLINE_SESSION_ID))
 .await?;
 local
 .delete(OFFLINE_CREDENTIALS_TABLE, &EntityId::from(OFFLINE_CREDENTIALS_ID))
 .await?;
 Ok(())
}

pub async fn load_single_user_config(local: &dyn LocalStore) -> AuthResult<Option<SingleUserConfig>> {
 let record = local
 .get(SINGLE_USER_CONFIG_TABLE, &EntityId::from(SINGLE_USER_CONFIG_ID))
 .await?;
 record.map(record_to_config).transpose()
}

pub async fn save_single_user_config(local: &dyn LocalStore, config: &SingleUserConfig) -> AuthResult<()> {
 local
 .put(SINGLE_USER_CONFIG_TABLE, config_to_record(config))
 .await?;
 Ok(())
}

fn credentials_to_record(creds: &OfflineCredentials) -> EntityRecord {
 let mut record = EntityRecord::new(
 EntityId::from(OFFLINE_CREDENTIALS_ID),
 creds.user_id.clone(),
 creds.cached_at,
 );
 record.set_field("email", json!(creds.email));
 record.set_field("password_hash", json!(creds.password_hash));
 record.set_field("profile", Value::Object(creds.profile.clone()));
 record
}

fn record_to_credentials(record: EntityRecord) -> AuthResult<OfflineCredentials> {
 let email = field_str(&record.fields, "email")?;
 let password_hash = field_str(&record.fields, "password_hash")?;
 let profile = match record.fields.get("profile") {
 Some(Value::Object(map)) => map.clone(),
 _ => Map::new(),
 };
 Ok(OfflineCredentials {
 user_id: record.user_id,
 email,
 password_hash,
 profile,
 cached_at: record.updated_at,
 })
}

fn session_to_record(session: &OfflineSession) -> EntityRecord {
 let mut record = EntityRecord::new(
 EntityId::from(OFFLINE_SESSION_ID),
 session.user_id.clone(),
 session.created_at,
 );
 record.set_field("token", json!(session.token));
 record
}

fn record_to_session(record: EntityRecord) -> AuthResult<OfflineSession> {
 let token = field_str(&record.fields, "token")?;
 Ok(OfflineSession {
 user_id: record.user_id,
 token,
 created_at: record.updated_at,
 })
}

fn config_to_record(config: &SingleUserConfig) -> EntityRecord {
 let mut record = EntityRecord::new(
 EntityId::from(SINGLE_USER_CONFIG_ID),
 config.remote_user_id.clone().unwrap_or_else(local_owner),
 config.updated_at,
 );
 record.set_field(
 "gate_type",
 json!(match config.gate_type {
 GateType::Code => "code",
 GateType::Password => "password",
 }),
 );
 if let Some(code_length) = config.code_length {
 record.set_field("code_length", json!(code_length));
 }
 record.set_field("gate_hash", json!(config.gate_hash));
 if let Some(email) = &config.email {
 record.set_field("email", json!(email));
 }
 record.set_field("profile", Value::Object(config.profile.clone()));
 if let Some(remote_user_id) = &config.remote_user_id {
 record.set_field("remote_user_id", json!(remote_user_id.0));
 }
 record.set_field("setup_at", json!(config.setup_at.to_rfc3339()));
 record
}

fn record_to_config(record: EntityRecord) -> AuthResult<SingleUserConfig> {
 let gate_type = match field_str(&record.fields, "gate_type")?.as_str() {
 "code" => GateType::Code,
 "password" => GateType::Password,
 other => return Err(AuthError::CorruptRecord(format!("unknown gate_type {other}"))),
 };
 let code_length = record.fields.get("code_length").and_then(Value::as_u64).map(|v| v as u8);
 let gate_hash = field_str(&record.fields, "gate_hash")?;
 let email = record.fields.get("email").and_then(Value::as_str).map(str::to_string);
 let profile = match record.fields.get("profile") {
 Some(Value::Object(map)) => map.clone(),
 _ => Map::new(),
 };
 let remote_user_id = record
 .fields
 .get("remote_user_id")
 .and_then(Value::as_str)
 .map(UserId::from);
 let setup_at = field_timestamp(&record.fields, "setup_at")?;

 Ok(SingleUserConfig {
 gate_type,
 code_length,
 gate_hash,
 email,
 profile,
 remote_user_id,
 setup_at,
 updated_at: record.updated_at,
 })
}

fn field_str(fields: &Map<String, Value>, key: &str) -> AuthResult<String> {
 fields
 .get(key)
 .and_then(Value::as_str)
 .map(str::to_string)
 .ok_or_else(|| AuthError::CorruptRecord(format!("missing field {key}")))
}

fn field_timestamp(fields: &Map<String, Value>, key: &str) -> AuthResult<DateTime<Utc>> {
 field_str(fields, key).and_then(|raw| {
 DateTime::parse_from_rfc3339(&raw)
 .map(|dt| dt.with_timezone(&Utc))
 .map_err(|_| AuthError::CorruptRecord(format!("invalid timestamp in {key}")))
 })
}

#[cfg(test)]
mod tests {
 use super::*;
 use sync_testkit::InMemoryLocalStore;

 fn sample_credentials() -> OfflineCredentials {
 OfflineCredentials {
 user_id: UserId::from("u1"),
 email: "user@example.com".into(),
 password_hash: "hash".into(),
 profile: Map::new(),
 cached_at: Utc::now(),
 }
 }

 #[tokio::test]
 async fn offline_credentials_round_trip_through_local_store() {
 let local = InMemoryLocalStore::new();
 let creds = sample_credentials();
 save_offline_credentials(&local, &creds).await.unwrap();

 let loaded = load_offline_credentials(&local).await.unwrap().unwrap();
 assert_eq!(loaded, creds);
 }

 #[tokio::test]
 async fn missing_offline_credentials_returns_none() {
 let local = InMemoryLocalStore::new();
 assert!(load_offline_credentials(&local).await.unwrap().is_none());
 }

 #[tokio::test]
 async fn single_user_config_round_trip_preserves_optional_fields() {
 let local = InMemoryLocalStore::new();
 let config = SingleUserConfig {
 gate_type: GateType::Code,
 code_length: Some(4),
 gate_hash: "hash".into(),
 email: Some("user@example.com".into()),
 profile: Map::new(),
 remote_user_id: None,
 setup_at: Utc::now(),
 updated_at: Utc::now(),
 };
 save_single_user_config(&local, &config).await.unwrap();

 let loaded = load_single_user_config(&local).await.unwrap().unwrap();
 assert_eq!(loaded.code_length, Some(4));
 assert_eq!(loaded.gate_type, GateType::Code);
 assert!(loaded.remote_user_id.is_none());
 }

 #[tokio::test]
 async fn clear_offline_state_removes_both_rows() {
 let local = InMemoryLocalStore::new();
 save_offline_credentials(&local, &sample_credentials()).await.unwrap();
 save_offline_session(
 &local,
 &OfflineSession {
 user_id: UserId::from("u1"),
 token: "tok".into(),
 created_at: Utc::now(),
 },
 )
 .await
 .unwrap();

 clear_offline_state(&local).await.unwrap();

 assert!(load_offline_credentials(&local).await.unwrap().is_none());
 assert!(load_offline_session(&local).await.unwrap().is_none());
 }
}
