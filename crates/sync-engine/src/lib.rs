//! Orchestrates a local-first bidirectional sync cycle:
//! single-writer mutex with watchdog, debounced push scheduling, the
//! push-then-pull cycle, startup hydration, and lifecycle teardown.
//! Capability implementations (actual storage, actual network) are supplied
//! by the embedder through `sync_capabilities`'s traits; everything in this
//! crate is runtime, not storage.

mod cursor;
mod engine;
mod error;
mod lifecycle;
mod mutex;
mod pull;
mod push;
mod recently_modified;
mod scheduler;
mod tombstone;

pub use cursor::{load_cursor, save_cursor};
pub use engine::{AuthState, EngineCapabilities, SyncEngine, SyncOutcome};
pub use error::{EngineError, EngineResult};
pub use lifecycle::{clear_local_cache, prune_stale_failures, run_maintenance_pass, CONFLICT_HISTORY_TABLE};
pub use mutex::{SyncMutex, SyncMutexGuard};
pub use pull::{pull_phase, PullOutcome};
pub use push::{push_phase, PushOutcome};
pub use recently_modified::RecentlyModifiedGuard;
pub use scheduler::PushScheduler;
pub use tombstone::gc_tombstones;
