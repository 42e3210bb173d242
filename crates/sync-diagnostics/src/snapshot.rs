use chrono::{DateTime, Utc};
use serde::Serialize;
use sync_config::SyncConfig;
use sync_egress::EgressSnapshot;
use sync_outbox::OutboxQueue;
use sync_realtime::RealtimeManager;
use sync_types::{ConflictHistoryEntry, OperationType};

/// Which auth mode the resolver last settled on, plus the gate's own
/// lifecycle state — both already computed elsewhere; this section just
/// relays them.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSection {
 pub auth_mode: String,
 pub gate_state: String,
 pub server_configured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
 Idle,
 Syncing,
 Offline,
 Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSection {
 pub state: EngineState,
 pub last_full_sync_at: Option<DateTime<Utc>>,
 pub mutex_held: bool,
 pub watchdog_anomaly_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueSection {
 pub pending_count: usize,
 pub by_table: Vec<(String, usize)>,
 pub by_operation_type: Vec<(OperationType, usize)>,
 pub permanently_failing_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RealtimeSection {
 pub connected: bool,
 pub push_only: bool,
 pub reconnect_attempts: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NetworkSection {
 pub online: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictsSection {
 /// Most recent entries first, capped by whatever limit the caller's
 /// history query used — diagnostics does not re-page.
 pub recent: Vec<ConflictHistoryEntry>,
}

/// The only failure state surfaced to the embedder's UI; everything else in
/// the snapshot is for support/debugging.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorsSection {
 pub auth_kicked_message: Option<String>,
 pub last_error: Option<String>,
 pub last_error_details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSection {
 pub prefix: String,
 pub table_names: Vec<String>,
 pub demo_mode: bool,
 pub sync_debounce_ms: u64,
 pub sync_interval_ms: u64,
 pub tombstone_max_age_days: i64,
}

impl ConfigSection {
 fn from_config(config: &SyncConfig) -> Self {
 Self {
 prefix: config.prefix.clone(),
 table_names: config.table_names(),
 demo_mode: config.demo_mode,
 sync_debounce_ms: config.tuning.sync_debounce_ms,
 sync_interval_ms: config.tuning.sync_interval_ms,
 tombstone_max_age_days: config.tuning.tombstone_max_age_days,
 }
 }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSnapshot {
 pub taken_at: DateTime<Utc>,
 pub sync: SyncSection,
 pub egress: EgressSnapshot,
 pub queue: QueueSection,
 pub realtime: RealtimeSection,
 pub network: NetworkSection,
 pub engine: EngineSection,
 pub conflicts: ConflictsSection,
 pub errors: ErrorsSection,
 pub config: ConfigSection,
}

/// Everything the snapshot needs, gathered by the caller (normally the
/// engine orchestrator, the one piece of state every other section derives
/// from). Kept as a plain bag rather than trait objects since assembling a
/// snapshot is a one-shot read, not a capability the engine swaps out.
pub struct SnapshotInputs<'a> {
 pub taken_at: DateTime<Utc>,
 pub auth_mode: String,
 pub gate_state: String,
 pub server_configured: bool,
 pub config: &'a SyncConfig,
 pub outbox: &'a OutboxQueue,
 pub retry_threshold: u32,
 pub egress: EgressSnapshot,
 pub realtime: Option<&'a RealtimeManager>,
 pub network_online: bool,
 pub engine_state: EngineState,
 pub last_full_sync_at: Option<DateTime<Utc>>,
 pub mutex_held: bool,
 pub watchdog_anomaly_count: u32,
 pub conflicts_tail: Vec<ConflictHistoryEntry>,
 pub auth_kicked_message: Option<String>,
 pub last_error: Option<String>,
 pub last_error_details: Option<String>,
}

/// Assembles the point-in-time snapshot. The only async step is reading the
/// outbox's current counts; everything else is already a plain value by the
/// time the caller builds `SnapshotInputs`.
pub async fn build_snapshot(inputs: SnapshotInputs<'_>) -> DiagnosticsSnapshot {
 let pending_count = inputs.outbox.pending_count().await;
 let by_table = inputs.outbox.counts_by_table().await.into_iter().collect();
 let by_operation_type = inputs
 .outbox
 .counts_by_operation_type()
 .await
 .into_iter()
 .collect();
 let permanently_failing_count = inputs
 .outbox
 .items_exceeding_retries(inputs.retry_threshold)
 .await
 .len();

 let realtime = match inputs.realtime {
 Some(manager) => RealtimeSection {
 connected: manager.connection_state() == sync_capabilities::ConnectionState::Connected,
 push_only: manager.is_push_only(),
 reconnect_attempts: manager.reconnect_attempts().await,
 },
 None => RealtimeSection {
 connected: false,
 push_only: false,
 reconnect_attempts: 0,
 },
 };

 DiagnosticsSnapshot {
 taken_at: inputs.taken_at,
 sync: SyncSection {
 auth_mode: inputs.auth_mode,
 gate_state: inputs.gate_state,
 server_configured: inputs.server_configured,
 },
 egress: inputs.egress,
 queue: QueueSection {
 pending_count,
 by_table,
 by_operation_type,
 permanently_failing_count,
 },
 realtime,
 network: NetworkSection {
 online: inputs.network_online,
 },
 engine: EngineSection {
 state: inputs.engine_state,
 last_full_sync_at: inputs.last_full_sync_at,
 mutex_held: inputs.mutex_held,
 watchdog_anomaly_count: inputs.watchdog_anomaly_count,
 },
 conflicts: ConflictsSection {
 recent: inputs.conflicts_tail,
 },
 errors: ErrorsSection {
 auth_kicked_message: inputs.auth_kicked_message,
 last_error: inputs.last_error,
 last_error_details: inputs.last_error_details,
 },
 config: ConfigSection::from_config(inputs.config),
 }
}
