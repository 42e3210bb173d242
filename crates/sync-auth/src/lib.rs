//! The offline-aware auth gate: pluggable PIN/password
//! credential material bound to a derived backend account, local
//! pre-check with rate-limit backoff, an offline pathway, and the
//! trusted-device/OTP verification flow. Lifecycle is modeled explicitly
//! as [`state_machine::GateState`] rather than derived from ad hoc storage
//! checks.

mod backoff;
mod error;
mod gate;
mod password;
mod precheck;
mod state_machine;
mod store;
mod trust;

pub use backoff::{compute_backoff_ms, GateCounters, LOCAL_FAILURE_THRESHOLD};
pub use error::{AuthError, AuthResult};
pub use gate::{SingleUserGate, UnlockOutcome};
pub use password::derive_password;
pub use precheck::{pre_check, pre_check_fail_open, PreCheckOutcome, PreCheckStrategy};
pub use state_machine::{GateInput, GateMachine, GateMachineState, GateState};
pub use store::{
 clear_offline_state, load_offline_credentials, load_offline_session, load_single_user_config,
 save_offline_credentials, save_offline_session, save_single_user_config, OFFLINE_CREDENTIALS_TABLE,
 OFFLINE_SESSION_TABLE, SINGLE_USER_CONFIG_ID, SINGLE_USER_CONFIG_TABLE,
};
pub use trust::{
 begin_device_verification, confirm_device_verification, is_device_trusted, pending_device_id_key,
 pending_device_label_key, trust_device, PendingDevice, TRUSTED_DEVICES_TABLE,
};
