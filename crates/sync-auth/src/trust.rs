//! Trusted-device registry and the OTP device-verification flow
//!.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sync_capabilities::{AuthProvider, Crypto, FetchParams, RemoteStore};
use sync_types::{DeviceId, TrustedDevice, UserId};
use tracing::warn;

use crate::error::AuthResult;

pub const TRUSTED_DEVICES_TABLE: &str = "trusted_devices";

pub fn pending_device_id_key(app_prefix: &str) -> String {
 format!("pending_{app_prefix}_device_id")
}

pub fn pending_device_label_key(app_prefix: &str) -> String {
 format!("pending_{app_prefix}_device_label")
}

/// The originating device, read from wherever the embedder surfaces user
/// metadata once the confirmation link is opened.
#[derive(Debug, Clone)]
pub struct PendingDevice {
 pub device_id: DeviceId,
 pub device_label: String,
}

/// `(user_id, device_id, app_prefix) -> trusted?`, fails **closed**: any
/// remote-store error is logged and treated as untrusted, since an
/// unreachable trust check must never silently grant access.
pub async fn is_device_trusted(
 remote: &dyn RemoteStore,
 user_id: &UserId,
 device_id: &DeviceId,
 app_prefix: &str,
 trust_duration_days: i64,
 now: DateTime<Utc>,
) -> bool {
 match fetch_trusted_device(remote, user_id, device_id, app_prefix).await {
 Ok(Some(device)) => device.is_valid(now, trust_duration_days),
 Ok(None) => false,
 Err(err) => {
 warn!(error = %err, %user_id, %device_id, "trusted-device check failed, denying");
 false
 }
 }
}

async fn fetch_trusted_device(
 remote: &dyn RemoteStore,
 user_id: &UserId,
 device_id: &DeviceId,
 app_prefix: &str,
) -> AuthResult<Option<TrustedDevice>> {
 let params = FetchParams::new(
 TRUSTED_DEVICES_TABLE,
 vec![
 "device_id".into(),
 "app_prefix".into(),
 "device_label".into(),
 "first_trusted_at".into(),
 "last_used_at".into(),
 ],
 )
 .with_owner(user_id.clone());

 let rows = remote.fetch(params).await?;
 for record in rows {
 if record.field("device_id").and_then(Value::as_str) == Some(device_id.0.as_str())
 && record.field("app_prefix").and_then(Value::as_str) == Some(app_prefix)
 {
 return Ok(trusted_device_from_fields(user_id, device_id, app_prefix, &record.fields));
 }
 }
 Ok(None)
}

fn trusted_device_from_fields(
 user_id: &UserId,
 device_id: &DeviceId,
 app_prefix: &str,
 fields: &Map<String, Value>,
) -> Option<TrustedDevice> {
 let device_label = fields.get("device_label")?.as_str()?.to_string();
 let first_trusted_at = parse_timestamp(fields.get("first_trusted_at")?.as_str()?)?;
 let last_used_at = parse_timestamp(fields.get("last_used_at")?.as_str()?)?;
 Some(TrustedDevice {
 user_id: user_id.clone(),
 device_id: device_id.clone(),
 app_prefix: app_prefix.to_string(),
 device_label,
 first_trusted_at,
 last_used_at,
 })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
 DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Trusts `device_id`, preserving `first_trusted_at` if a row already
/// exists and refreshing `last_used_at` to `now`.
pub async fn trust_device(
 remote: &dyn RemoteStore,
 crypto: &dyn Crypto,
 user_id: &UserId,
 device_id: &DeviceId,
 app_prefix: &str,
 device_label: &str,
 now: DateTime<Utc>,
) -> AuthResult<()> {
 let existing = fetch_trusted_device(remote, user_id, device_id, app_prefix).await?;
 let first_trusted_at = existing.map(|d| d.first_trusted_at).unwrap_or(now);

 let mut record = sync_types::EntityRecord::new(
 sync_types::EntityId::from(crypto.random_uuid()),
 user_id.clone(),
 now,
 );
 record.set_field("device_id", json!(device_id.0));
 record.set_field("app_prefix", json!(app_prefix));
 record.set_field("device_label", json!(device_label));
 record.set_field("first_trusted_at", json!(first_trusted_at.to_rfc3339()));
 record.set_field("last_used_at", json!(now.to_rfc3339()));

 remote.upsert(TRUSTED_DEVICES_TABLE, &record).await?;
 Ok(())
}

/// Stores the originating device under namespaced pending keys and sends a
/// one-time code to `email`. The caller keeps the session alive so the
/// originating device can poll [`is_device_trusted`] until confirmed.
pub async fn begin_device_verification(
 auth: &dyn AuthProvider,
 user_id: &UserId,
 device_id: &DeviceId,
 device_label: &str,
 email: &str,
 app_prefix: &str,
) -> AuthResult<()> {
 let mut metadata = Map::new();
 metadata.insert(pending_device_id_key(app_prefix), json!(device_id.0));
 metadata.insert(pending_device_label_key(app_prefix), json!(device_label));
 auth.update_user_metadata(user_id, metadata).await?;
 auth.send_one_time_code(email).await?;
 Ok(())
}

/// Verifies the one-time code, then trusts **both** the pending
/// (originating) device and the device that opened the confirmation link,
/// and clears the pending metadata keys. Sign-in is complete only once
/// this returns `Ok`.
#[allow(clippy::too_many_arguments)]
pub async fn confirm_device_verification(
 remote: &dyn RemoteStore,
 auth: &dyn AuthProvider,
 crypto: &dyn Crypto,
 token_hash: &str,
 app_prefix: &str,
 now: DateTime<Utc>,
 pending: PendingDevice,
 confirming_device_id: &DeviceId,
 confirming_device_label: &str,
) -> AuthResult<()> {
 let session = auth.verify_one_time_code(token_hash).await?;

 trust_device(
 remote,
 crypto,
 &session.user_id,
 &pending.device_id,
 app_prefix,
 &pending.device_label,
 now,
 )
 .await?;

 if confirming_device_id.0 != pending.device_id.0 {
 trust_device(
 remote,
 crypto,
 &session.user_id,
 confirming_device_id,
 app_prefix,
 confirming_device_label,
 now,
 )
 .await?;
 }

 let mut cleared = Map::new();
 cleared.insert(pending_device_id_key(app_prefix), Value::Null);
 cleared.insert(pending_device_label_key(app_prefix), Value::Null);
 auth.update_user_metadata(&session.user_id, cleared).await?;

 Ok(())
}
