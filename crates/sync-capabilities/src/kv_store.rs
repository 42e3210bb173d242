use crate::error::CapabilityResult;
use async_trait::async_trait;

/// Flat string key-value storage: the cursor, the debug flag, and
/// crash-recovery breadcrumbs all live here, namespaced by `prefix`.
///
/// Mirrors the teacher's `SecureStorage` trait shape (`get`/`set`/`delete`
/// plus default helpers), made async since every other capability in this
/// crate is.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
 async fn get(&self, key: &str) -> CapabilityResult<Option<String>>;

 async fn set(&self, key: &str, value: &str) -> CapabilityResult<()>;

 async fn remove(&self, key: &str) -> CapabilityResult<()>;

 /// Default implementation built on `get`, matching the teacher's
 /// `SecureStorage::has` pattern.
 async fn has(&self, key: &str) -> CapabilityResult<bool> {
 Ok(self.get(key).await?.is_some())
 }

 /// Keys beginning with `prefix`. Used to purge all backend-prefixed auth
 /// keys on corrupted-storage recovery. Implementations that cannot
 /// enumerate keys return an empty list; callers must treat that as "no
 /// keys to purge", not as an error.
 async fn list_keys_with_prefix(&self, _prefix: &str) -> CapabilityResult<Vec<String>> {
 Ok(Vec::new())
 }
}
