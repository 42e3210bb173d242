use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sync_capabilities::{CapabilityResult, Clock, Crypto, Network, NetworkEvent};
use tokio::sync::mpsc;

/// A clock a test can pin and advance explicitly, rather than racing real
/// wall-clock time.
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Real SHA-256, since the hashing algorithm itself is not something a test
/// should fake — only the random UUID is made deterministic, via a counter.
pub struct FakeCrypto {
    uuid_counter: Mutex<u64>,
}

impl Default for FakeCrypto {
    fn default() -> Self {
        Self {
            uuid_counter: Mutex::new(0),
        }
    }
}

impl FakeCrypto {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Crypto for FakeCrypto {
    fn sha256_hex(&self, input: &str) -> String {
        let digest = Sha256::digest(input.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn random_uuid(&self) -> String {
        let mut counter = self.uuid_counter.lock().unwrap();
        *counter += 1;
        format!("00000000-0000-0000-0000-{:012x}", *counter)
    }
}

/// A network capability whose `is_online` a test flips directly and whose
/// subscribers receive events pushed via `emit`.
pub struct FakeNetwork {
    online: Mutex<bool>,
    sender: Mutex<Option<mpsc::Sender<NetworkEvent>>>,
}

impl Default for FakeNetwork {
    fn default() -> Self {
        Self {
            online: Mutex::new(true),
            sender: Mutex::new(None),
        }
    }
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        *self.online.lock().unwrap() = online;
    }

    pub async fn emit(&self, event: NetworkEvent) {
        let sender = self.sender.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

#[async_trait]
impl Network for FakeNetwork {
    fn is_online(&self) -> bool {
        *self.online.lock().unwrap()
    }

    async fn subscribe(&self) -> CapabilityResult<mpsc::Receiver<NetworkEvent>> {
        let (tx, rx) = mpsc::channel(32);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_64_char_lowercase_hex() {
        let crypto = FakeCrypto::new();
        let digest = crypto.sha256_hex("1234_acme");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn random_uuid_is_stable_across_instances_but_unique_within_one() {
        let crypto = FakeCrypto::new();
        let a = crypto.random_uuid();
        let b = crypto.random_uuid();
        assert_ne!(a, b);
    }

    #[test]
    fn clock_advance_moves_now_forward() {
        let start = Utc::now();
        let clock = FakeClock::new(start);
        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(5));
    }
}
