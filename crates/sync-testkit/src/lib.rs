//! In-memory fakes of every `sync-capabilities` trait, shared by all crates'
//! tests. Mirrors `daemon_database::Database::open_in_memory` and the
//! recording-sink test doubles in `session-sync-sink`: no real disk, network,
//! or socket is touched by any test in this workspace.

mod auth_provider;
mod environment;
mod kv_store;
mod local_store;
mod realtime;
mod remote_store;

pub use auth_provider::FakeAuthProvider;
pub use environment::{FakeClock, FakeCrypto, FakeNetwork};
pub use kv_store::InMemoryKeyValueStore;
pub use local_store::InMemoryLocalStore;
pub use realtime::FakeRealtimeChannel;
pub use remote_store::InMemoryRemoteStore;
