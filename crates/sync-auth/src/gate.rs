//! Orchestrates the pieces in [`crate::precheck`], [`crate::backoff`],
//! [`crate::password`], [`crate::store`], and [`crate::trust`] into the
//! single-user unlock flow described

use chrono::{DateTime, Utc};
use sync_capabilities::{AuthProvider, BackendSession, Crypto, LocalStore, RemoteStore};
use sync_identity::mask_email;
use sync_types::{DeviceId, OfflineCredentials, OfflineSession};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::backoff::GateCounters;
use crate::error::{AuthError, AuthResult};
use crate::password::derive_password;
use crate::precheck::{pre_check, PreCheckOutcome, PreCheckStrategy};
use crate::store::{
 load_offline_credentials, load_single_user_config, save_offline_credentials,
 save_offline_session, save_single_user_config,
};
use crate::trust::is_device_trusted;

#[derive(Debug)]
pub enum UnlockOutcome {
 /// Signed in with the backend; the device was already trusted or
 /// device verification is disabled.
 Online(BackendSession),
 /// Offline authenticated start; no network round-trip occurred.
 Offline(OfflineSession),
 /// Backend sign-in succeeded but this device needs the OTP flow
 /// before the session is considered complete.
 DeviceVerificationRequired { masked_email: String },
}

/// The single-user gate: pluggable PIN/password credential material bound
/// to one backend account, with local pre-check, rate-limit backoff, and
/// an offline pathway. One instance is held for the lifetime of the
/// running app; its counters are NOT persisted (a restart always reopens
/// with a clean backoff state, matching the teacher's in-memory-only retry
/// counters).
pub struct SingleUserGate {
 app_prefix: String,
 trust_duration_days: i64,
 device_verification_enabled: bool,
 counters: Mutex<GateCounters>,
}

impl SingleUserGate {
 pub fn new(app_prefix: impl Into<String>, trust_duration_days: i64, device_verification_enabled: bool) -> Self {
 Self {
 app_prefix: app_prefix.into(),
 trust_duration_days,
 device_verification_enabled,
 counters: Mutex::new(GateCounters::new()),
 }
 }

 /// Attempts to unlock against the backend. Callers should only invoke
 /// this while online; see [`Self::offline_unlock`] for the offline
 /// pathway.
 pub async fn unlock(
 &self,
 local: &dyn LocalStore,
 remote: &dyn RemoteStore,
 auth: &dyn AuthProvider,
 crypto: &dyn Crypto,
 device_id: &DeviceId,
 device_label: &str,
 gate: &str,
 now: DateTime<Utc>,
 ) -> AuthResult<UnlockOutcome> {
 let mut config = load_single_user_config(local)
 .await?
 .ok_or_else(|| AuthError::CorruptRecord("no single-user config".into()))?;
 let email = config
 .email
 .clone()
 .ok_or_else(|| AuthError::CorruptRecord("single-user config missing email".into()))?;

 let cached_hash = if config.gate_hash.is_empty() {
 None
 } else {
 Some(config.gate_hash.as_str())
 };
 let mut counters = self.counters.lock().await;
 let outcome = pre_check(cached_hash, gate, crypto, now, &mut counters);

 let strategy = match outcome {
 PreCheckOutcome::RejectedLocally { invalidate_hash } => {
 if invalidate_hash {
 warn!("local gate hash invalidated after repeated mismatches");
 config.gate_hash.clear();
 config.updated_at = now;
 drop(counters);
 save_single_user_config(local, &config).await?;
 }
 return Err(AuthError::IncorrectGate);
 }
 PreCheckOutcome::RateLimited { retry_after_ms } => {
 return Err(AuthError::RateLimited { retry_after_ms });
 }
 PreCheckOutcome::Proceed(strategy) => strategy,
 };
 drop(counters);

 let password = derive_password(gate, &self.app_prefix);
 let session = match auth.sign_in(&email, &password).await {
 Ok(session) => session,
 Err(err) => {
 let mut counters = self.counters.lock().await;
 match strategy {
 PreCheckStrategy::LocalMatch => {
 config.gate_hash.clear();
 config.updated_at = now;
 drop(counters);
 save_single_user_config(local, &config).await?;
 }
 PreCheckStrategy::NoLocalHash => counters.record_no_cache_failure(now),
 }
 return Err(AuthError::Capability(err));
 }
 };

 let mut counters = self.counters.lock().await;
 counters.reset();
 drop(counters);

 config.gate_hash = crypto.sha256_hex(gate);
 config.remote_user_id = Some(session.user_id.clone());
 config.updated_at = now;
 save_single_user_config(local, &config).await?;

 let credentials = OfflineCredentials {
 user_id: session.user_id.clone(),
 email: email.clone(),
 password_hash: config.gate_hash.clone(),
 profile: config.profile.clone(),
 cached_at: now,
 };
 save_offline_credentials(local, &credentials).await?;

 let offline_session = OfflineSession {
 user_id: session.user_id.clone(),
 token: crypto.random_uuid(),
 created_at: now,
 };
 save_offline_session(local, &offline_session).await?;

 if !self.device_verification_enabled {
 info!(user_id = %session.user_id, "device verification disabled, unlock complete");
 return Ok(UnlockOutcome::Online(session));
 }

 let trusted = is_device_trusted(
 remote,
 &session.user_id,
 device_id,
 &self.app_prefix,
 self.trust_duration_days,
 now,
 )
 .await;

 if trusted {
 return Ok(UnlockOutcome::Online(session));
 }

 crate::trust::begin_device_verification(auth, &session.user_id, device_id, device_label, &email, &self.app_prefix)
 .await?;

 Ok(UnlockOutcome::DeviceVerificationRequired {
 masked_email: mask_email(&email),
 })
 }

 /// Authenticates from the cached offline credentials without a
 /// backend round-trip. Expired cached backend sessions stay usable
 /// offline; the access-control layer is consulted only once sync
 /// resumes.
 pub async fn offline_unlock(
 &self,
 local: &dyn LocalStore,
 crypto: &dyn Crypto,
 gate: &str,
 now: DateTime<Utc>,
 ) -> AuthResult<OfflineSession> {
 let credentials = load_offline_credentials(local)
 .await?
 .ok_or(AuthError::NoOfflineSession)?;

 let hash = crypto.sha256_hex(gate);
 if hash != credentials.password_hash {
 return Err(AuthError::IncorrectGate);
 }

 if let Some(session) = crate::store::load_offline_session(local).await? {
 if session.user_id == credentials.user_id {
 return Ok(session);
 }
 }

 let session = OfflineSession {
 user_id: credentials.user_id,
 token: crypto.random_uuid(),
 created_at: now,
 };
 save_offline_session(local, &session).await?;
 Ok(session)
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use serde_json::Map;
 use sync_testkit::{FakeAuthProvider, FakeCrypto, InMemoryLocalStore, InMemoryRemoteStore};
 use sync_types::{GateType, SingleUserConfig, UserId};

 async fn seeded(local: &InMemoryLocalStore, gate: &str, crypto: &FakeCrypto) -> SingleUserConfig {
 let config = SingleUserConfig {
 gate_type: GateType::Code,
 code_length: Some(4),
 gate_hash: crypto.sha256_hex(gate),
 email: Some("user@example.com".into()),
 profile: Map::new(),
 remote_user_id: None,
 setup_at: Utc::now(),
 updated_at: Utc::now(),
 };
 save_single_user_config(local, &config).await.unwrap();
 config
 }

 #[tokio::test]
 async fn correct_gate_unlocks_online_when_verification_disabled() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let crypto = FakeCrypto::new();
 let auth = FakeAuthProvider::new();
 seeded(&local, "1234", &crypto).await;
 auth.register("user@example.com", "1234_acme", UserId::from("u1"));

 let gate_state = SingleUserGate::new("acme", 90, false);
 let outcome = gate_state
 .unlock(&local, &remote, &auth, &crypto, &DeviceId::from("d1"), "Chrome on macOS", "1234", Utc::now())
 .await
 .unwrap();

 assert!(matches!(outcome, UnlockOutcome::Online(_)));
 }

 #[tokio::test]
 async fn wrong_gate_against_cached_hash_rejects_without_calling_backend() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let crypto = FakeCrypto::new();
 let auth = FakeAuthProvider::new();
 seeded(&local, "1234", &crypto).await;
 auth.register("user@example.com", "1234_acme", UserId::from("u1"));

 let gate_state = SingleUserGate::new("acme", 90, false);
 let result = gate_state
 .unlock(&local, &remote, &auth, &crypto, &DeviceId::from("d1"), "Chrome on macOS", "0000", Utc::now())
 .await;

 assert!(matches!(result, Err(AuthError::IncorrectGate)));
 }

 #[tokio::test]
 async fn untrusted_device_requires_verification_when_enabled() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let crypto = FakeCrypto::new();
 let auth = FakeAuthProvider::new();
 seeded(&local, "1234", &crypto).await;
 auth.register("user@example.com", "1234_acme", UserId::from("u1"));

 let gate_state = SingleUserGate::new("acme", 90, true);
 let outcome = gate_state
 .unlock(&local, &remote, &auth, &crypto, &DeviceId::from("d1"), "Chrome on macOS", "1234", Utc::now())
 .await
 .unwrap();

 assert!(matches!(outcome, UnlockOutcome::DeviceVerificationRequired { .. }));
 }

 #[tokio::test]
 async fn offline_unlock_succeeds_against_cached_credentials() {
 let local = InMemoryLocalStore::new();
 let crypto = FakeCrypto::new();
 let credentials = OfflineCredentials {
 user_id: UserId::from("u1"),
 email: "user@example.com".into(),
 password_hash: crypto.sha256_hex("1234"),
 profile: Map::new(),
 cached_at: Utc::now(),
 };
 save_offline_credentials(&local, &credentials).await.unwrap();

 let gate_state = SingleUserGate::new("acme", 90, false);
 let session = gate_state.offline_unlock(&local, &crypto, "1234", Utc::now()).await.unwrap();
 assert_eq!(session.user_id, UserId::from("u1"));
 }

 #[tokio::test]
 async fn offline_unlock_rejects_wrong_gate() {
 let local = InMemoryLocalStore::new();
 let crypto = FakeCrypto::new();
 let credentials = OfflineCredentials {
 user_id: UserId::from("u1"),
 email: "user@example.com".into(),
 password_hash: crypto.sha256_hex("1234"),
 profile: Map::new(),
 cached_at: Utc::now(),
 };
 save_offline_credentials(&local, &credentials).await.unwrap();

 let gate_state = SingleUserGate::new("acme", 90, false);
 let result = gate_state.offline_unlock(&local, &crypto, "0000", Utc::now()).await;
 assert!(matches!(result, Err(AuthError::IncorrectGate)));
 }

 #[tokio::test]
 async fn offline_unlock_without_cached_credentials_errors() {
 let local = InMemoryLocalStore::new();
 let crypto = FakeCrypto::new();

 let gate_state = SingleUserGate::new("acme", 90, false);
 let result = gate_state.offline_unlock(&local, &crypto, "1234", Utc::now()).await;
 assert!(matches!(result, Err(AuthError::NoOfflineSession)));
 }
}
