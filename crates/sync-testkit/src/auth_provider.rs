use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use sync_capabilities::{AuthProvider, BackendSession, CapabilityError, CapabilityResult};
use sync_types::UserId;

/// An in-memory `AuthProvider` backing an accounts table keyed by email.
/// Tests seed accounts via `register`, then drive sign-in/refresh/OTP through
/// the trait surface exactly as `sync-auth` would.
#[derive(Default)]
pub struct FakeAuthProvider {
 accounts: Mutex<HashMap<String, Account>>,
 metadata: Mutex<HashMap<String, Map<String, Value>>>,
 pending_otp: Mutex<HashMap<String, String>>,
 sessions: Mutex<HashMap<String, BackendSession>>,
}

struct Account {
 user_id: UserId,
 password: String,
}

impl FakeAuthProvider {
 pub fn new() -> Self {
 Self::default()
 }

 pub fn register(&self, email: &str, password: &str, user_id: UserId) {
 self.accounts.lock().unwrap().insert(
 email.to_string(),
 Account {
 user_id,
 password: password.to_string(),
 },
 );
 }

 /// Test helper: read back the one-time code sent to `email` without
 /// going through a real mail transport.
 pub fn peek_otp(&self, email: &str) -> Option<String> {
 self.pending_otp.lock().unwrap().get(email).cloned()
 }

 fn mint_session(&self, user_id: UserId, email: &str) -> BackendSession {
 let session = BackendSession {
 access_token: format!("at-{}", user_id.0),
 refresh_token: format!("rt-{}", user_id.0),
 user_id: user_id.clone(),
 email: email.to_string(),
 expires_at: Utc::now() + Duration::hours(1),
 };
 self.sessions
 .lock()
 .unwrap()
 .insert(user_id.0.clone(), session.clone());
 session
 }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
 async fn sign_in(&self, email: &str, password: &str) -> CapabilityResult<BackendSession> {
 let accounts = self.accounts.lock().unwrap();
 let account = accounts
 .get(email)
 .ok_or_else(|| CapabilityError::Auth("no such account".into()))?;
 if account.password != password {
 return Err(CapabilityError::Auth("invalid credentials".into()));
 }
 let user_id = account.user_id.clone();
 drop(accounts);
 Ok(self.mint_session(user_id, email))
 }

 async fn sign_up(&self, email: &str, password: &str) -> CapabilityResult<BackendSession> {
 let user_id = UserId::new(format!("user-{email}"));
 self.register(email, password, user_id.clone());
 Ok(self.mint_session(user_id, email))
 }

 async fn refresh(&self, refresh_token: &str) -> CapabilityResult<BackendSession> {
 let sessions = self.sessions.lock().unwrap();
 let existing = sessions
 .values()
 .find(|s| s.refresh_token == refresh_token)
 .cloned()
 .ok_or_else(|| CapabilityError::Auth("unknown refresh token".into()))?;
 drop(sessions);
 Ok(self.mint_session(existing.user_id, &existing.email))
 }

 async fn current_session(&self) -> CapabilityResult<Option<BackendSession>> {
 Ok(self.sessions.lock().unwrap().values().next().cloned())
 }

 async fn update_user_metadata(
 &self,
 user_id: &UserId,
 metadata: Map<String, Value>,
 ) -> CapabilityResult<()> {
 let mut all = self.metadata.lock().unwrap();
 let entry = all.entry(user_id.0.clone()).or_default();
 for (k, v) in metadata {
 entry.insert(k, v);
 }
 Ok(())
 }

 async fn send_one_time_code(&self, email: &str) -> CapabilityResult<()> {
 self.pending_otp
 .lock()
 .unwrap()
 .insert(email.to_string(), format!("otp-{email}"));
 Ok(())
 }

 async fn verify_one_time_code(&self, token_hash: &str) -> CapabilityResult<BackendSession> {
 let pending = self.pending_otp.lock().unwrap();
 let email = pending
 .iter()
 .find(|(_, code)| format!("hash-{code}") == token_hash)
 .map(|(email, _)| email.clone())
 .ok_or_else(|| CapabilityError::Auth("invalid or expired code".into()))?;
 drop(pending);

 let accounts = self.accounts.lock().unwrap();
 let user_id = accounts
 .get(&email)
 .map(|a| a.user_id.clone())
 .ok_or_else(|| CapabilityError::Auth("no such account".into()))?;
 drop(accounts);

 self.pending_otp.lock().unwrap().remove(&email);
 Ok(self.mint_session(user_id, &email))
 }

 async fn sign_out(&self) -> CapabilityResult<()> {
 self.sessions.lock().unwrap().clear();
 Ok(())
 }
}
