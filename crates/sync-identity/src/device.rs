use sync_capabilities::{Crypto, KeyValueStore};

/// Returns the persistent per-device id, creating and storing one on first
/// use. Never rotated once written.
pub async fn device_id(
 kv: &dyn KeyValueStore,
 crypto: &dyn Crypto,
 prefix: &str,
) -> sync_capabilities::CapabilityResult<String> {
 let key = device_id_key(prefix);
 if let Some(existing) = kv.get(&key).await? {
 return Ok(existing);
 }
 let fresh = crypto.random_uuid();
 kv.set(&key, &fresh).await?;
 Ok(fresh)
}

pub fn device_id_key(prefix: &str) -> String {
 format!("{prefix}_device_id")
}

#[cfg(test)]
mod tests {
 use super::*;
 use sync_testkit::{FakeCrypto, InMemoryKeyValueStore};

 #[tokio::test]
 async fn first_call_creates_and_persists_an_id() {
 let kv = InMemoryKeyValueStore::new();
 let crypto = FakeCrypto::new();

 let id = device_id(&kv, &crypto, "acme").await.unwrap();
 assert!(!id.is_empty());
 assert_eq!(kv.get("acme_device_id").await.unwrap(), Some(id));
 }

 #[tokio::test]
 async fn subsequent_calls_return_the_same_id() {
 let kv = InMemoryKeyValueStore::new();
 let crypto = FakeCrypto::new();

 let first = device_id(&kv, &crypto, "acme").await.unwrap();
 let second = device_id(&kv, &crypto, "acme").await.unwrap();
 assert_eq!(first, second);
 }
}
