//! Shared data-model types for the sync engine.
//!
//! Every other `sync-*` crate depends on this one for the record, outbox,
//! cursor, and auth-record shapes described by the data model. Nothing here
//! talks to a store, a socket, or the clock — it is pure data.

mod auth;
mod conflict;
mod ids;
mod outbox;
mod record;
mod table;

pub use auth::{GateType, OfflineCredentials, OfflineSession, SingleUserConfig, TrustedDevice};
pub use conflict::{ConflictHistoryEntry, ConflictWinner};
pub use ids::{DeviceId, EntityId, UserId};
pub use outbox::{OperationType, OutboxItem};
pub use record::EntityRecord;
pub use table::TableConfig;

use chrono::{DateTime, Utc};

/// Per-user monotonic pull cursor. Never decreases across successful pulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SyncCursor(pub DateTime<Utc>);

impl SyncCursor {
 /// The cursor used before a user's first successful pull.
 pub fn epoch() -> Self {
 Self(DateTime::<Utc>::UNIX_EPOCH)
 }

 pub fn timestamp(&self) -> DateTime<Utc> {
 self.0
 }

 /// Advance to `candidate` unless it would move the cursor backward.
 pub fn advance(&mut self, candidate: DateTime<Utc>) {
 if candidate > self.0 {
 self.0 = candidate;
 }
 }
}

impl Default for SyncCursor {
 fn default() -> Self {
 Self::epoch()
 }
}
