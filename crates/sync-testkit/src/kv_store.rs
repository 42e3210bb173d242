use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sync_capabilities::{CapabilityResult, KeyValueStore};

/// An in-memory `KeyValueStore`.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
 entries: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
 pub fn new() -> Self {
 Self::default()
 }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
 async fn get(&self, key: &str) -> CapabilityResult<Option<String>> {
 Ok(self.entries.lock().unwrap().get(key).cloned())
 }

 async fn set(&self, key: &str, value: &str) -> CapabilityResult<()> {
 self.entries
 .lock()
 .unwrap()
 .insert(key.to_string(), value.to_string());
 Ok(())
 }

 async fn remove(&self, key: &str) -> CapabilityResult<()> {
 self.entries.lock().unwrap().remove(key);
 Ok(())
 }

 async fn list_keys_with_prefix(&self, prefix: &str) -> CapabilityResult<Vec<String>> {
 Ok(self
 .entries
 .lock()
 .unwrap()
 .keys()
 .filter(|k| k.starts_with(prefix))
 .cloned()
 .collect())
 }
}
