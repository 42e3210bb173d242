//! Device identity: a stable per-device id, a user-agent derived label, and
//! email masking for display.

mod device;
mod email;
mod label;

pub use device::{device_id, device_id_key};
pub use email::mask_email;
pub use label::device_label;
