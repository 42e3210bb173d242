//! Behavioral contracts the embedder implements: local store, remote store,
//! realtime channel, auth provider, key-value store, clock/crypto/network.
//!
//! No framework types appear here — everything is plain data plus
//! `async_trait` traits, so the engine crates never need to know whether
//! they're talking to SQLite or IndexedDB, Supabase or a plain Postgres
//! instance behind PostgREST.

mod auth_provider;
mod environment;
mod error;
mod kv_store;
mod local_store;
mod realtime;
mod remote_store;

pub use auth_provider::{AuthProvider, BackendSession};
pub use environment::{Clock, Crypto, Network, NetworkEvent};
pub use error::{CapabilityError, CapabilityResult};
pub use kv_store::KeyValueStore;
pub use local_store::LocalStore;
pub use realtime::{ConnectionState, RealtimeChannel, RealtimeEvent, RealtimeEventType};
pub use remote_store::{FetchParams, RemoteStore};
