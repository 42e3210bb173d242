use crate::error::CapabilityResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Monotonic wall clock, injected so tests can control time.
pub trait Clock: Send + Sync {
 fn now(&self) -> DateTime<Utc>;
}

/// SHA-256 hashing and stable random UUID generation.
pub trait Crypto: Send + Sync {
 /// 64-char lowercase hex SHA-256 digest of `input`, UTF-8 encoded.
 fn sha256_hex(&self, input: &str) -> String;

 fn random_uuid(&self) -> String;
}

/// Host environment signals the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
 Online,
 Offline,
 VisibilityChanged { visible: bool },
}

/// Current connectivity plus a subscription to online/offline/visibility
/// transitions. Binds the "browser-only primitives" (`navigator.onLine`,
/// visibility change) behind a single capability per the REDESIGN FLAGS.
#[async_trait]
pub trait Network: Send + Sync {
 fn is_online(&self) -> bool;

 /// Delivers at-least-once; callers should tolerate duplicate events.
 async fn subscribe(&self) -> CapabilityResult<mpsc::Receiver<NetworkEvent>>;
}
