/// Errors a capability implementation may surface to the engine.
///
/// Capabilities are supplied by the embedder (real SQLite, real Supabase,
/// real WebSocket); this crate only defines the shape of what can go wrong so
/// the engine can apply a uniform retry/backoff policy regardless of which
/// concrete implementation is plugged in.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
 #[error("local store error: {0}")]
 LocalStore(String),

 #[error("remote store error: {0}")]
 RemoteStore(String),

 #[error("realtime channel error: {0}")]
 Realtime(String),

 #[error("auth provider error: {0}")]
 Auth(String),

 #[error("key-value store error: {0}")]
 KeyValue(String),

 #[error("network transport error: {0}")]
 Network(String),

 #[error("serialization error: {0}")]
 Serialization(#[from] serde_json::Error),
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;
