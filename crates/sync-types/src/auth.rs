use crate::{DeviceId, UserId};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// The shape of the user-facing gate secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateType {
 Code,
 Password,
}

/// Singleton row cached after an authoritative remote sign-in, keyed
/// `'current_user'` in local storage. Never written with a plaintext
/// password; the hash is SHA-256 hex over the gate string.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OfflineCredentials {
 pub user_id: UserId,
 pub email: String,
 pub password_hash: String,
 pub profile: Map<String, Value>,
 pub cached_at: DateTime<Utc>,
}

/// Singleton row keyed `'current_session'`. No expiry of its own; revoked
/// only by explicit lock/reset or superseded by a fresh authoritative sign-in.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OfflineSession {
 pub user_id: UserId,
 pub token: String,
 pub created_at: DateTime<Utc>,
}

/// The single-user gate's persistent configuration, keyed `'config'`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SingleUserConfig {
 pub gate_type: GateType,
 pub code_length: Option<u8>,
 pub gate_hash: String,
 pub email: Option<String>,
 pub profile: Map<String, Value>,
 pub remote_user_id: Option<UserId>,
 pub setup_at: DateTime<Utc>,
 pub updated_at: DateTime<Utc>,
}

/// Remote row keyed by the natural key `(user_id, device_id, app_prefix)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrustedDevice {
 pub user_id: UserId,
 pub device_id: DeviceId,
 pub app_prefix: String,
 pub device_label: String,
 pub first_trusted_at: DateTime<Utc>,
 pub last_used_at: DateTime<Utc>,
}

impl TrustedDevice {
 /// `now - last_used_at <= trust_duration_days`.
 pub fn is_valid(&self, now: DateTime<Utc>, trust_duration_days: i64) -> bool {
 let age = now.signed_duration_since(self.last_used_at);
 age <= chrono::Duration::days(trust_duration_days)
 }
}

/// Default trust window
pub const DEFAULT_TRUST_DURATION_DAYS: i64 = 90;

#[cfg(test)]
mod tests {
 use super::*;

 fn device_at(last_used_at: DateTime<Utc>) -> TrustedDevice {
 TrustedDevice {
 user_id: UserId::from("u1"),
 device_id: DeviceId::from("d1"),
 app_prefix: "app".into(),
 device_label: "Chrome on macOS".into(),
 first_trusted_at: last_used_at,
 last_used_at,
 }
 }

 #[test]
 fn device_within_trust_window_is_valid() {
 let last_used = Utc::now() - chrono::Duration::days(10);
 let device = device_at(last_used);
 assert!(device.is_valid(Utc::now(), DEFAULT_TRUST_DURATION_DAYS));
 }

 #[test]
 fn device_past_trust_window_is_invalid() {
 let last_used = Utc::now() - chrono::Duration::days(91);
 let device = device_at(last_used);
 assert!(!device.is_valid(Utc::now(), DEFAULT_TRUST_DURATION_DAYS));
 }

 #[test]
 fn boundary_at_exactly_the_window_is_valid() {
 let now = Utc::now();
 let device = device_at(now - chrono::Duration::days(DEFAULT_TRUST_DURATION_DAYS));
 assert!(device.is_valid(now, DEFAULT_TRUST_DURATION_DAYS));
 }
}
