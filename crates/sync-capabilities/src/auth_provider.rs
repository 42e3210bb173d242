use crate::error::CapabilityResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sync_types::UserId;

/// A live backend session as returned by the auth provider.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSession {
 pub access_token: String,
 pub refresh_token: String,
 pub user_id: UserId,
 pub email: String,
 pub expires_at: DateTime<Utc>,
}

impl BackendSession {
 pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
 now >= self.expires_at
 }
}

/// Account operations the gate drives. `sign_in`/`sign_up` take the derived
/// gate password (`gate || "_" || appPrefix`), not the raw gate — that
/// derivation happens in `sync-auth`, above this trait.
#[async_trait]
pub trait AuthProvider: Send + Sync {
 async fn sign_in(&self, email: &str, password: &str) -> CapabilityResult<BackendSession>;

 async fn sign_up(&self, email: &str, password: &str) -> CapabilityResult<BackendSession>;

 async fn refresh(&self, refresh_token: &str) -> CapabilityResult<BackendSession>;

 async fn current_session(&self) -> CapabilityResult<Option<BackendSession>>;

 async fn update_user_metadata(
 &self,
 user_id: &UserId,
 metadata: Map<String, Value>,
 ) -> CapabilityResult<()>;

 async fn send_one_time_code(&self, email: &str) -> CapabilityResult<()>;

 async fn verify_one_time_code(&self, token_hash: &str) -> CapabilityResult<BackendSession>;

 async fn sign_out(&self) -> CapabilityResult<()>;
}

#[cfg(test)]
mod tests {
 use super::*;

 fn session(expires_at: DateTime<Utc>) -> BackendSession {
 BackendSession {
 access_token: "at".into(),
 refresh_token: "rt".into(),
 user_id: UserId::from("u1"),
 email: "user@example.com".into(),
 expires_at,
 }
 }

 #[test]
 fn is_expired_compares_against_now() {
 let past = session(Utc::now() - chrono::Duration::seconds(1));
 let future = session(Utc::now() + chrono::Duration::minutes(5));
 assert!(past.is_expired(Utc::now()));
 assert!(!future.is_expired(Utc::now()));
 }
}
