use crate::error::CapabilityResult;
use async_trait::async_trait;
use sync_types::{EntityRecord, UserId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeEventType {
 Insert,
 Update,
 Delete,
}

#[derive(Debug, Clone)]
pub struct RealtimeEvent {
 pub table: String,
 pub event_type: RealtimeEventType,
 pub record: EntityRecord,
 pub old_record: Option<EntityRecord>,
}

/// Coarse connection health, surfaced to diagnostics and used by the engine
/// to decide whether push-only mode applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
 Disconnected,
 Connecting,
 Connected,
 Error,
}

/// Subscription to per-table change events, scoped by owner.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
 /// Subscribes `table` filtered to `owner`; events are delivered on
 /// `sender` until `unsubscribe` is called or the channel drops.
 async fn subscribe(
 &self,
 table: &str,
 owner: &UserId,
 sender: mpsc::Sender<RealtimeEvent>,
 ) -> CapabilityResult<()>;

 async fn unsubscribe(&self, table: &str) -> CapabilityResult<()>;

 fn connection_state(&self) -> ConnectionState;
}
