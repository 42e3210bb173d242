//! Explicit gate lifecycle, replacing implicit state derivation from
//! storage reads with a declared transition table.

use rust_fsm::*;

state_machine! {
 #[derive(Debug, Clone, PartialEq, Eq)]
 pub gate_machine(Locked)

 Locked => {
 Unlock => PreChecking
 },
 PreChecking => {
 LocalMatchConfirmed => Online,
 LocalMismatch => Locked,
 NoLocalHash => RateLimited,
 BackendRejected => Locked
 },
 RateLimited => {
 BackoffElapsed => Online,
 StillBackingOff => RateLimited,
 BackendRejected => Locked
 },
 Online => {
 DeviceUntrusted => DeviceVerificationPending,
 GoOffline => Offline,
 SignOut => Locked
 },
 Offline => {
 Reconnected => Online,
 SignOut => Locked
 },
 DeviceVerificationPending => {
 DeviceTrusted => Online,
 GoOffline => Offline,
 SignOut => Locked
 }
}

pub use gate_machine::Input as GateInput;
pub use gate_machine::State as GateMachineState;
pub use gate_machine::StateMachine as GateMachine;

/// External-facing view of the gate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
 Locked,
 PreChecking,
 RateLimited,
 Online,
 Offline,
 DeviceVerificationPending,
}

impl GateState {
 /// Sync may run only once the gate has resolved to an authenticated
 /// state, online or offline.
 pub fn allows_sync(&self) -> bool {
 matches!(self, GateState::Online | GateState::Offline)
 }
}

impl From<&GateMachineState> for GateState {
 fn from(state: &GateMachineState) -> Self {
 match state {
 GateMachineState::Locked => GateState::Locked,
 GateMachineState::PreChecking => GateState::PreChecking,
 GateMachineState::RateLimited => GateState::RateLimited,
 GateMachineState::Online => GateState::Online,
 GateMachineState::Offline => GateState::Offline,
 GateMachineState::DeviceVerificationPending => GateState::DeviceVerificationPending,
 }
 }
}
