use std::sync::Mutex;

use async_trait::async_trait;
use sync_capabilities::{CapabilityResult, ConnectionState, RealtimeChannel, RealtimeEvent};
use sync_types::UserId;
use tokio::sync::mpsc;

/// An in-memory `RealtimeChannel` a test drives by calling `push_event`
/// directly, mirroring `session_sync_sink`'s recording-sink test doubles.
pub struct FakeRealtimeChannel {
 state: Mutex<ConnectionState>,
 sender: Mutex<Option<mpsc::Sender<RealtimeEvent>>>,
}

impl Default for FakeRealtimeChannel {
 fn default() -> Self {
 Self {
 state: Mutex::new(ConnectionState::Disconnected),
 sender: Mutex::new(None),
 }
 }
}

impl FakeRealtimeChannel {
 pub fn new() -> Self {
 Self::default()
 }

 pub fn set_state(&self, state: ConnectionState) {
 *self.state.lock().unwrap() = state;
 }

 /// Deliver an event to the active subscriber, if any.
 pub async fn push_event(&self, event: RealtimeEvent) {
 let sender = self.sender.lock().unwrap().clone();
 if let Some(sender) = sender {
 let _ = sender.send(event).await;
 }
 }
}

#[async_trait]
impl RealtimeChannel for FakeRealtimeChannel {
 async fn subscribe(
 &self,
 _table: &str,
 _owner: &UserId,
 sender: mpsc::Sender<RealtimeEvent>,
 ) -> CapabilityResult<()> {
 *self.sender.lock().unwrap() = Some(sender);
 self.set_state(ConnectionState::Connected);
 Ok(())
 }

 async fn unsubscribe(&self, _table: &str) -> CapabilityResult<()> {
 *self.sender.lock().unwrap() = None;
 self.set_state(ConnectionState::Disconnected);
 Ok(())
 }

 fn connection_state(&self) -> ConnectionState {
 *self.state.lock().unwrap()
 }
}
