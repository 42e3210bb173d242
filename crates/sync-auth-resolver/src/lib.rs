//! Auth-state resolution: decides which authenticated mode
//! the app runs in on load and on reconnect, walking an ordered decision
//! table over demo mode, the single-user config, the explicit lock flag,
//! and the backend/offline session fallback chain.

mod error;
mod lock;
mod resolver;

pub use error::{ResolverError, ResolverResult};
pub use lock::{is_locked, set_locked};
pub use resolver::{resolve_auth_state, AuthMode, OfflineProfile, ResolvedAuth};
