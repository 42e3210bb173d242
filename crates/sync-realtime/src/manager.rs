//! Ties subscription, self-echo dedup, and reconnect backoff into one
//! orchestrator, mirroring the worker-loop/coalescing shape of a
//! long-lived realtime sink: a shared channel fans events from every
//! subscribed table into one receiver, and the manager is the single
//! place that decides what the engine actually needs to act on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sync_capabilities::{CapabilityResult, ConnectionState, RealtimeChannel, RealtimeEvent};
use sync_types::{EntityId, UserId};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::backoff::{ReconnectPolicy, ReconnectState};
use crate::dedup::DedupRing;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Owns the realtime subscription set for one sync session. The channel
/// is shared (`Arc`) so an embedder can hold its own handle for
/// reconnect/teardown concerns alongside the manager.
pub struct RealtimeManager {
 channel: Arc<dyn RealtimeChannel>,
 dedup: Mutex<DedupRing>,
 reconnect_policy: ReconnectPolicy,
 reconnect_state: Mutex<ReconnectState>,
}

impl RealtimeManager {
 pub fn new(channel: Arc<dyn RealtimeChannel>) -> Self {
 Self {
 channel,
 dedup: Mutex::new(DedupRing::default()),
 reconnect_policy: ReconnectPolicy::default(),
 reconnect_state: Mutex::new(ReconnectState::new()),
 }
 }

 pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
 self.reconnect_policy = policy;
 self
 }

 /// Subscribes to every table in `tables`, scoped to `owner`, sharing
 /// one sender/receiver pair — `RealtimeEvent` already carries its own
 /// `table`, so there is no need for a channel per table.
 pub async fn subscribe_all(
 &self,
 tables: &[String],
 owner: &UserId,
 ) -> CapabilityResult<mpsc::Receiver<RealtimeEvent>> {
 let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
 for table in tables {
 self.channel.subscribe(table, owner, tx.clone()).await?;
 }
 self.reconnect_state.lock().await.reset();
 Ok(rx)
 }

 pub async fn unsubscribe_all(&self, tables: &[String]) -> CapabilityResult<()> {
 for table in tables {
 self.channel.unsubscribe(table).await?;
 }
 Ok(())
 }

 pub fn connection_state(&self) -> ConnectionState {
 self.channel.connection_state()
 }

 /// Whether the engine should treat outbound pushes as best-effort only
 /// (no live confirmation), without a scheduled pull to back it up.
 pub fn is_push_only(&self) -> bool {
 self.channel.connection_state() == ConnectionState::Connected
 }

 /// Drains the next event off `rx`, suppressing self-echo via the dedup
 /// ring. Returns `None` once the channel closes.
 pub async fn next_deduped(&self, rx: &mut mpsc::Receiver<RealtimeEvent>) -> Option<RealtimeEvent> {
 loop {
 let event = rx.recv().await?;
 let mut ring = self.dedup.lock().await;
 if ring.contains(&event.table, &event.record.id, event.record.updated_at) {
 debug!(table = %event.table, id = %event.record.id, "suppressing self-echo realtime event");
 continue;
 }
 ring.record(&event.table, &event.record.id, event.record.updated_at);
 return Some(event);
 }
 }

 /// Pre-seeds the dedup ring with a write the engine just pushed, so the
 /// self-echo that arrives later over the socket is suppressed rather
 /// than re-fed through the conflict resolver.
 pub async fn record_own_write(&self, table: &str, id: &EntityId, updated_at: DateTime<Utc>) {
 self.dedup.lock().await.record(table, id, updated_at);
 }

 /// Records a failed (re)connect attempt and returns the delay to wait
 /// before retrying, along with whether the error ceiling has been hit.
 pub async fn record_connect_failure(&self) -> (u64, bool) {
 let mut state = self.reconnect_state.lock().await;
 let delay = state.record_failure(&self.reconnect_policy);
 let ceiling_hit = state.has_reached_error_ceiling(&self.reconnect_policy);
 if ceiling_hit {
 warn!("realtime reconnect attempts reached the error ceiling, continuing to retry at capped delay");
 }
 (delay, ceiling_hit)
 }

 pub async fn reset_reconnect_state(&self) {
 self.reconnect_state.lock().await.reset();
 }

 pub async fn reconnect_attempts(&self) -> u32 {
 self.reconnect_state.lock().await.attempts()
 }
}
