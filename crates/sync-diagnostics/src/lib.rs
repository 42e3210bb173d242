//! Point-in-time diagnostics snapshot. This is the only
//! module allowed to depend on every other component crate — it only reads
//! their already-computed state and reassembles it into one JSON-serializable
//! document; nothing here drives behavior.
//!
//! Mirrors the teacher's `observability::LogConfig`/`SamplingConfig` shape:
//! a plain struct assembled from already-live counters, not a subsystem with
//! its own background collection loop.

mod snapshot;

pub use snapshot::{
 ConflictsSection, ConfigSection, EngineSection, EngineState, ErrorsSection, NetworkSection,
 QueueSection, RealtimeSection, SyncSection,
};
pub use snapshot::{build_snapshot, DiagnosticsSnapshot, SnapshotInputs};
