//! The single initialization input the embedder provides at `initEngine`
//! time: table declarations, tuning knobs, and auth options.
//!
//! Loading/saving follows the teacher's `Config`/`Paths` split: the schema is
//! plain `serde` data, `Paths` resolves where it lives on disk, and only the
//! log level is overridable by environment variable at runtime — everything
//! else is fixed by the embedding application.

mod config;
mod error;
mod paths;

pub use config::{
 AuthOptions, DeviceVerificationOptions, SingleUserOptions, SyncConfig, TableDecl, TuningKnobs,
 DEFAULT_LOG_LEVEL, DEFAULT_ONLINE_RECONNECT_COOLDOWN_MS, DEFAULT_SYNC_DEBOUNCE_MS,
 DEFAULT_SYNC_INTERVAL_MS, DEFAULT_TOMBSTONE_MAX_AGE_DAYS, DEFAULT_TRUST_DURATION_DAYS,
 DEFAULT_VISIBILITY_SYNC_MIN_AWAY_MS,
};
pub use error::{ConfigError, ConfigResult};
pub use paths::Paths;
