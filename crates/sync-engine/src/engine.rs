//! The sync cycle orchestrator: owns the outbox, cursor,
//! mutex+watchdog, debounced scheduler, realtime manager, and egress
//! counters, and exposes `run_full_sync` plus the startup/shutdown
//! lifecycle described there. Grounded on `daemon-lifecycle`'s explicit,
//! fallible-step construction (module-level singletons
//! become injected capability instances) combined with
//! `message-sync-retriable-worker`'s batching/cursor/backoff loop shape.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use sync_capabilities::{Clock, KeyValueStore, LocalStore, Network, RealtimeChannel, RemoteStore};
use sync_config::SyncConfig;
use sync_diagnostics::{build_snapshot, DiagnosticsSnapshot, EngineState, SnapshotInputs};
use sync_egress::EgressCounters;
use sync_outbox::OutboxQueue;
use sync_realtime::RealtimeManager;
use sync_types::{ConflictHistoryEntry, EntityId, SyncCursor, TableConfig, UserId};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cursor::{load_cursor, save_cursor};
use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{clear_local_cache as clear_local_cache_impl, run_maintenance_pass};
use crate::mutex::SyncMutex;
use crate::pull::pull_phase;
use crate::push::push_phase;
use crate::recently_modified::RecentlyModifiedGuard;
use crate::scheduler::PushScheduler;

/// Outbox rows past this many retries are dropped outright during
/// maintenance, and reported as "permanently failing" in diagnostics before
/// that point.
const RETRY_HARD_CEILING: u32 = 10;

/// Watchdog ceiling expressed as a multiple of the configured sync
/// interval — several expected cycles' worth of held time before a lock is
/// assumed stuck,
const WATCHDOG_CEILING_CYCLES: i64 = 6;

/// Bounds the in-memory conflict-history tail so a long-lived session
/// doesn't grow it forever; diagnostics only ever wants the most recent
/// entries anyway.
const CONFLICT_HISTORY_CAPACITY: usize = 200;

/// Which authenticated mode the embedder has told the engine it is in.
/// Set externally by whatever resolves the design §4.8 and by the auth
/// gate's sign-in/sign-out/refresh callbacks — the engine never calls an
/// `AuthProvider` itself (the engine reacts to published
/// auth-state transitions rather than owning the sign-in flow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
 Authenticated {
 user_id: UserId,
 /// `None` for a session type that never expires outright.
 expires_at: Option<DateTime<Utc>>,
 },
 OfflineAuthenticated {
 user_id: UserId,
 },
 Unauthenticated,
}

impl AuthState {
 fn user_id(&self) -> Option<&UserId> {
 match self {
 AuthState::Authenticated { user_id, .. } => Some(user_id),
 AuthState::OfflineAuthenticated { user_id } => Some(user_id),
 AuthState::Unauthenticated => None,
 }
 }
}

/// The capability set an embedder hands to [`SyncEngine::new()`] at
/// `initEngine` time. `realtime` is optional: an embedder
/// with no realtime backend simply runs on the scheduled pull alone.
pub struct EngineCapabilities {
 pub local: Arc<dyn LocalStore>,
 pub remote: Arc<dyn RemoteStore>,
 pub kv: Arc<dyn KeyValueStore>,
 pub network: Arc<dyn Network>,
 pub clock: Arc<dyn Clock>,
 pub realtime: Option<Arc<dyn RealtimeChannel>>,
}

/// What a sync cycle actually did, returned from `run_full_sync` for a
/// caller (typically a test, or an embedder's debug UI) that wants more
/// than the snapshot surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
 /// `false` when the cycle was skipped outright (pre-flight failure or
 /// mutex already held) rather than having run and found nothing to do.
 pub ran: bool,
 pub pushed_groups: usize,
 pub failed_groups: usize,
 pub rows_pulled: usize,
 pub pull_skipped: bool,
}

struct StatusInner {
 engine_state: EngineState,
 last_full_sync_at: Option<DateTime<Utc>>,
 last_error: Option<String>,
 last_error_details: Option<String>,
 auth_kicked_message: Option<String>,
}

impl Default for StatusInner {
 fn default() -> Self {
 Self {
 engine_state: EngineState::Idle,
 last_full_sync_at: None,
 last_error: None,
 last_error_details: None,
 auth_kicked_message: None,
 }
 }
}

pub struct SyncEngine {
 config: SyncConfig,
 local: Arc<dyn LocalStore>,
 remote: Arc<dyn RemoteStore>,
 kv: Arc<dyn KeyValueStore>,
 network: Arc<dyn Network>,
 clock: Arc<dyn Clock>,
 realtime_channel: Option<Arc<dyn RealtimeChannel>>,
 realtime: RwLock<Option<RealtimeManager>>,
 outbox: OutboxQueue,
 mutex: SyncMutex,
 recently_modified: RecentlyModifiedGuard,
 egress: EgressCounters,
 scheduler: PushScheduler,
 auth_state: StdMutex<AuthState>,
 /// Cleared by the offline hook, set by the online hook once it has
 /// re-validated auth.
 authenticated_after_reconnect: AtomicBool,
 hydrated: AtomicBool,
 status: StdMutex<StatusInner>,
 conflict_history: StdMutex<Vec<ConflictHistoryEntry>>,
}

impl SyncEngine {
 pub fn new(config: SyncConfig, capabilities: EngineCapabilities) -> Self {
 let egress = EgressCounters::new(capabilities.clock.now());
 let scheduler = PushScheduler::new(config.tuning.sync_debounce_ms);
 Self {
 config,
 local: capabilities.local,
 remote: capabilities.remote,
 kv: capabilities.kv,
 network: capabilities.network,
 clock: capabilities.clock,
 realtime_channel: capabilities.realtime,
 realtime: RwLock::new(None),
 outbox: OutboxQueue::new(),
 mutex: SyncMutex::new(),
 recently_modified: RecentlyModifiedGuard::new(),
 egress,
 scheduler,
 auth_state: StdMutex::new(AuthState::Unauthenticated),
 authenticated_after_reconnect: AtomicBool::new(true),
 hydrated: AtomicBool::new(false),
 status: StdMutex::new(StatusInner::default()),
 conflict_history: StdMutex::new(Vec::new()),
 }
 }

 pub fn config(&self) -> &SyncConfig {
 &self.config
 }

 pub fn outbox(&self) -> &OutboxQueue {
 &self.outbox
 }

 pub fn egress(&self) -> &EgressCounters {
 &self.egress
 }

 pub fn recently_modified(&self) -> &RecentlyModifiedGuard {
 &self.recently_modified
 }

 pub fn is_hydrated(&self) -> bool {
 self.hydrated.load(Ordering::SeqCst)
 }

 pub fn auth_state(&self) -> AuthState {
 self.auth_state.lock().unwrap().clone()
 }

 /// Called by whatever owns the auth lifecycle (the gate's sign-in
 /// callback, `resolveAuthState`, or a refresh handler) whenever the
 /// authenticated mode changes.
 pub fn set_auth_state(&self, state: AuthState) {
 *self.auth_state.lock().unwrap() = state;
 }

 /// The network "offline" hook: flips the reconnect-auth flag so sync
 /// cycles are pre-flight-rejected until `mark_reauthenticated_after_reconnect`
 /// runs, and records it for diagnostics.
 pub fn mark_offline(&self) {
 self.authenticated_after_reconnect.store(false, Ordering::SeqCst);
 self.status.lock().unwrap().engine_state = EngineState::Offline;
 }

 /// The network "online" hook, called once the embedder has re-validated
 /// auth against the backend.
 pub fn mark_reauthenticated_after_reconnect(&self) {
 self.authenticated_after_reconnect.store(true, Ordering::SeqCst);
 }

 fn require_user_id(&self) -> EngineResult<UserId> {
 self.auth_state
 .lock()
 .unwrap()
 .user_id()
 .cloned()
 .ok_or(EngineError::NotAuthenticated)
 }

 fn preflight_ok(&self, now: DateTime<Utc>) -> bool {
 if !self.network.is_online() {
 return false;
 }
 if !self.authenticated_after_reconnect.load(Ordering::SeqCst) {
 return false;
 }
 match &*self.auth_state.lock().unwrap() {
 AuthState::Authenticated { expires_at, .. } => {
 expires_at.map(|exp| now < exp).unwrap_or(true)
 }
 AuthState::OfflineAuthenticated { .. } => true,
 AuthState::Unauthenticated => false,
 }
 }

 async fn is_push_only(&self) -> bool {
 self.realtime
 .read()
 .await
 .as_ref()
 .map(RealtimeManager::is_push_only)
 .unwrap_or(false)
 }

 fn set_engine_state(&self, state: EngineState) {
 self.status.lock().unwrap().engine_state = state;
 }

 fn record_error(&self, err: &EngineError) {
 let mut status = self.status.lock().unwrap();
 status.last_error = Some(err.to_string());
 status.last_error_details = Some(format!("{err:?}"));
 status.engine_state = EngineState::Error;
 }

 fn push_conflict_history(&self, entries: Vec<ConflictHistoryEntry>) {
 if entries.is_empty() {
 return;
 }
 let mut history = self.conflict_history.lock().unwrap();
 history.extend(entries);
 let overflow = history.len().saturating_sub(CONFLICT_HISTORY_CAPACITY);
 if overflow > 0 {
 history.drain(0..overflow);
 }
 }

 async fn local_store_is_empty(&self, tables: &[TableConfig]) -> EngineResult<bool> {
 for table in tables {
 if !self.local.all(&table.name).await?.is_empty() {
 return Ok(false);
 }
 }
 Ok(true)
 }

 /// `startSyncEngine`: awaits local-store open,
 /// validates schema, subscribes realtime if configured, runs initial
 /// hydration or an ordinary sync, then one maintenance pass. Does not
 /// start the watchdog or periodic timers itself — see
 /// [`Self::spawn_watchdog`] and [`Self::schedule_sync_push`], which need
 /// an `Arc<Self>` to hand a clone to their background tasks.
 pub async fn start(&self) -> EngineResult<()> {
 self.local.wait_for_db().await?;
 let user_id = self.require_user_id()?;
 let tables = self.config.table_configs();

 let report = sync_schema::validate_schema(&*self.remote, &tables, &user_id).await;
 if !report.all_ok() {
 for failure in report.failures() {
 warn!(table = %failure.table, failure = ?failure.failure, "schema validation failed for table");
 }
 self.record_error(&EngineError::SchemaInvalid);
 return Err(EngineError::SchemaInvalid);
 }

 if let Some(channel) = self.realtime_channel.clone() {
 let manager = RealtimeManager::new(channel);
 let table_names = self.config.table_names();
 if let Err(err) = manager.subscribe_all(&table_names, &user_id).await {
 warn!(error = %err, "realtime subscription failed, continuing with pull-on-schedule");
 }
 *self.realtime.write().await = Some(manager);
 }

 let hydrating = self.local_store_is_empty(&tables).await?;
 if hydrating {
 info!("local store empty, running initial hydration");
 self.run_cycle(true, false, Some(SyncCursor::epoch())).await?;
 } else {
 self.run_cycle(true, false, None).await?;
 }

 run_maintenance_pass(
 &*self.local,
 &self.outbox,
 &tables,
 self.config.tuning.tombstone_max_age_days,
 RETRY_HARD_CEILING,
 self.clock.now(),
 )
 .await?;

 self.hydrated.store(true, Ordering::SeqCst);
 Ok(())
 }

 /// `stopSyncEngine`: tears down the realtime subscription, force-releases
 /// the mutex (a normal shutdown, not a watchdog anomaly), and resets the
 /// hydration flag so a subsequent `start` re-runs hydration logic fresh.
 pub async fn stop(&self) -> EngineResult<()> {
 if let Some(manager) = self.realtime.write().await.take() {
 let _ = manager.unsubscribe_all(&self.config.table_names()).await;
 }
 self.mutex.release_unconditionally();
 self.hydrated.store(false, Ordering::SeqCst);
 Ok(())
 }

 /// `clearLocalCache`: wipes every configured table, the outbox, and
 /// conflict history (both the local-store copy and this process's
 /// in-memory tail), and drops the cursor.
 pub async fn clear_local_cache(&self) -> EngineResult<()> {
 let user_id = self.require_user_id()?;
 let tables = self.config.table_configs();
 clear_local_cache_impl(&*self.local, &*self.kv, &self.outbox, &tables, &user_id).await?;
 self.conflict_history.lock().unwrap().clear();
 self.hydrated.store(false, Ordering::SeqCst);
 Ok(())
 }

 /// `runFullSync(quiet, skipPull)`.
 pub async fn run_full_sync(&self, quiet: bool, skip_pull: bool) -> EngineResult<SyncOutcome> {
 self.run_cycle(quiet, skip_pull, None).await
 }

 async fn run_cycle(
 &self,
 quiet: bool,
 skip_pull: bool,
 force_cursor: Option<SyncCursor>,
 ) -> EngineResult<SyncOutcome> {
 let now = self.clock.now();

 if !self.preflight_ok(now) {
 if !self.network.is_online() {
 self.set_engine_state(EngineState::Offline);
 }
 return Ok(SyncOutcome::default());
 }

 let Some(_guard) = self.mutex.try_acquire(now) else {
 // Another cycle already holds the mutex and subsumes this one.
 return Ok(SyncOutcome::default());
 };

 if !quiet {
 self.set_engine_state(EngineState::Syncing);
 }

 let user_id = self.require_user_id()?;
 let tables = self.config.table_configs();
 let realtime_guard = self.realtime.read().await;
 let realtime_ref = realtime_guard.as_ref();

 let push_outcome = match push_phase(
 &*self.local,
 &*self.remote,
 &self.outbox,
 &self.egress,
 realtime_ref,
 now,
 )
 .await
 {
 Ok(outcome) => outcome,
 Err(EngineError::AuthKicked) => {
 drop(realtime_guard);
 drop(_guard);
 self.handle_auth_kicked(false).await;
 return Err(EngineError::AuthKicked);
 }
 Err(err) => {
 self.record_error(&err);
 return Err(err);
 }
 };

 // A forced cursor means this is the initial hydration pull: it must
 // run even if realtime is already connected, or an embedder whose
 // socket connects before the first cycle would start with an empty
 // local store forever.
 let should_skip_pull = force_cursor.is_none()
 && (skip_pull || realtime_ref.map(RealtimeManager::is_push_only).unwrap_or(false));

 let rows_pulled = if should_skip_pull {
 0
 } else {
 let cursor = match force_cursor {
 Some(cursor) => cursor,
 None => load_cursor(&*self.kv, &user_id).await?,
 };
 let pending = self.outbox.pending_entity_ids().await;
 let outcome = pull_phase(
 &*self.local,
 &*self.remote,
 &*self.kv,
 &self.config.prefix,
 &tables,
 &user_id,
 cursor,
 &self.recently_modified,
 &pending,
 &self.egress,
 now,
 )
 .await?;
 save_cursor(&*self.kv, &user_id, outcome.cursor).await?;
 self.push_conflict_history(outcome.history);
 outcome.rows_applied
 };

 drop(realtime_guard);
 self.recently_modified.prune(now);

 {
 let mut status = self.status.lock().unwrap();
 status.last_full_sync_at = Some(now);
 status.engine_state = EngineState::Idle;
 status.last_error = None;
 status.last_error_details = None;
 }

 Ok(SyncOutcome {
 ran: true,
 pushed_groups: push_outcome.pushed_groups,
 failed_groups: push_outcome.failed_groups,
 rows_pulled,
 pull_skipped: should_skip_pull,
 })
 }

 /// `onAuthKicked`: purges in-memory auth, and by default
 /// drops the outbox so a subsequent sign-in never pushes stale intents
 /// under a new identity — the stricter of the two variants the spec's
 /// open design questions allow, opted into explicitly by `preserve_outbox`.
 pub async fn handle_auth_kicked(&self, preserve_outbox: bool) {
 *self.auth_state.lock().unwrap() = AuthState::Unauthenticated;
 if !preserve_outbox {
 self.outbox.clear().await;
 }
 let mut status = self.status.lock().unwrap();
 status.auth_kicked_message =
 Some("Your session is no longer valid. Please sign in again.".to_string());
 status.engine_state = EngineState::Error;
 }

 /// Called by the repository layer after every successful local write, so
 /// a pull that races the push of the same change doesn't clobber it.
 pub fn notify_local_write(&self, table: &str, id: &EntityId) {
 self.recently_modified.mark(table, id, self.clock.now());
 }

 /// The watchdog's single check, meant to be called on a periodic timer
 /// (see [`Self::spawn_watchdog`] for the `Arc<Self>` convenience).
 pub fn watchdog_tick(&self) {
 let now = self.clock.now();
 let ceiling = chrono::Duration::milliseconds(
 self.config.tuning.sync_interval_ms as i64 * WATCHDOG_CEILING_CYCLES,
 );
 if self.mutex.watchdog_check(now, ceiling) {
 warn!("sync mutex force-released by watchdog past the expected-cycle ceiling");
 }
 }

 pub async fn diagnostics(
 &self,
 auth_mode: impl Into<String>,
 gate_state: impl Into<String>,
 server_configured: bool,
 ) -> DiagnosticsSnapshot {
 let now = self.clock.now();
 let (engine_state, last_full_sync_at, last_error, last_error_details, auth_kicked_message) = {
 let status = self.status.lock().unwrap();
 (
 status.engine_state,
 status.last_full_sync_at,
 status.last_error.clone(),
 status.last_error_details.clone(),
 status.auth_kicked_message.clone(),
 )
 };
 let conflicts_tail = self.conflict_history.lock().unwrap().clone();
 let realtime_guard = self.realtime.read().await;

 build_snapshot(SnapshotInputs {
 taken_at: now,
 auth_mode: auth_mode.into(),
 gate_state: gate_state.into(),
 server_configured,
 config: &self.config,
 outbox: &self.outbox,
 retry_threshold: RETRY_HARD_CEILING,
 egress: self.egress.snapshot(),
 realtime: realtime_guard.as_ref(),
 network_online: self.network.is_online(),
 engine_state,
 last_full_sync_at,
 mutex_held: self.mutex.is_held(),
 watchdog_anomaly_count: self.mutex.anomaly_count(),
 conflicts_tail,
 auth_kicked_message,
 last_error,
 last_error_details,
 })
 .await
 }
}

impl SyncEngine {
 /// Debounced push scheduling (`scheduleSyncPush`): repeated calls
 /// coalesce into one eventual cycle. Needs `Arc<Self>` since the
 /// scheduled closure outlives the caller's stack frame.
 pub fn schedule_sync_push(self: &Arc<Self>) {
 let engine = Arc::clone(self);
 self.scheduler.schedule(move || async move {
 let skip_pull = engine.is_push_only().await;
 if let Err(err) = engine.run_full_sync(false, skip_pull).await {
 warn!(error = %err, "scheduled sync cycle failed");
 }
 });
 }

 /// Spawns the watchdog's periodic timer. The returned handle is the
 /// caller's to abort on `stop`; the engine itself does not track it,
 /// mirroring `daemon-lifecycle`'s pattern of the owner holding its own
 /// task handles rather than the singleton doing so internally.
 pub fn spawn_watchdog(self: &Arc<Self>, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
 let engine = Arc::clone(self);
 tokio::spawn(async move {
 let mut ticker = tokio::time::interval(interval);
 loop {
 ticker.tick().await;
 engine.watchdog_tick();
 }
 })
 }

 /// Spawns the periodic sync timer (`syncIntervalMs`), independent of the
 /// debounced push scheduler — this is the steady heartbeat that covers
 /// missed realtime events and stale pulls, not the write-triggered path.
 pub fn spawn_periodic_sync(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
 let engine = Arc::clone(self);
 let interval = std::time::Duration::from_millis(self.config.tuning.sync_interval_ms);
 tokio::spawn(async move {
 let mut ticker = tokio::time::interval(interval);
 loop {
 ticker.tick().await;
 let skip_pull = engine.is_push_only().await;
 if let Err(err) = engine.run_full_sync(true, skip_pull).await {
 warn!(error = %err, "periodic sync cycle failed");
 }
 }
 })
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use sync_config::TableDecl;
 use sync_testkit::{
 FakeClock, FakeNetwork, FakeRealtimeChannel, InMemoryKeyValueStore, InMemoryLocalStore,
 InMemoryRemoteStore,
 };
 use sync_types::EntityRecord;

 fn config() -> SyncConfig {
 SyncConfig::new(
 "acme",
 vec![TableDecl {
 name: "goals".into(),
 columns: "id, updated_at, deleted, user_id, current_value".into(),
 ownership_filter: Some("user_id".into()),
 is_singleton: false,
 exclude_from_conflict: vec![],
 numeric_merge_fields: vec!["current_value".into()],
 }],
 )
 }

 struct Harness {
 engine: SyncEngine,
 remote: Arc<InMemoryRemoteStore>,
 local: Arc<InMemoryLocalStore>,
 network: Arc<FakeNetwork>,
 clock: Arc<FakeClock>,
 }

 fn harness() -> Harness {
 let local = Arc::new(InMemoryLocalStore::new());
 let remote = Arc::new(InMemoryRemoteStore::new());
 let kv = Arc::new(InMemoryKeyValueStore::new());
 let network = Arc::new(FakeNetwork::new());
 let clock = Arc::new(FakeClock::new(Utc::now()));

 let engine = SyncEngine::new(
 config(),
 EngineCapabilities {
 local: local.clone(),
 remote: remote.clone(),
 kv,
 network: network.clone(),
 clock: clock.clone(),
 realtime: None,
 },
 );
 engine.set_auth_state(AuthState::Authenticated {
 user_id: UserId::from("u1"),
 expires_at: None,
 });

 Harness { engine, remote, local, network, clock }
 }

 #[tokio::test]
 async fn run_full_sync_pushes_then_pulls_and_advances_cursor() {
 let h = harness();
 h.engine
 .outbox
 .enqueue_set(
 "goals",
 EntityId::from("g1"),
 "current_value",
 serde_json::json!(1),
 h.clock.now(),
 )
 .await;
 h.local
 .seed("goals", EntityRecord::new(EntityId::from("g1"), UserId::from("u1"), h.clock.now()));

 let outcome = h.engine.run_full_sync(false, false).await.unwrap();
 assert!(outcome.ran);
 assert_eq!(outcome.pushed_groups, 1);
 assert!(h.engine.outbox.is_empty().await);
 }

 #[tokio::test]
 async fn run_full_sync_is_skipped_while_offline() {
 let h = harness();
 h.network.set_online(false);

 let outcome = h.engine.run_full_sync(false, false).await.unwrap();
 assert!(!outcome.ran);
 assert!(h.remote.upserts.lock().unwrap().is_empty());
 }

 #[tokio::test]
 async fn run_full_sync_with_no_authenticated_user_errors() {
 let local = InMemoryLocalStore::new();
 let remote = InMemoryRemoteStore::new();
 let kv = InMemoryKeyValueStore::new();
 let network = FakeNetwork::new();
 let clock = FakeClock::new(Utc::now());
 let engine = SyncEngine::new(
 config(),
 EngineCapabilities {
 local: Arc::new(local),
 remote: Arc::new(remote),
 kv: Arc::new(kv),
 network: Arc::new(network),
 clock: Arc::new(clock),
 realtime: None,
 },
 );

 // Pre-flight fails closed before the missing-user error would even
 // surface: `Unauthenticated` never satisfies `preflight_ok`.
 let outcome = engine.run_full_sync(false, false).await.unwrap();
 assert!(!outcome.ran);
 }

 #[tokio::test]
 async fn second_concurrent_cycle_is_a_no_op_while_the_first_holds_the_mutex() {
 let h = harness();
 let now = h.clock.now();
 let _guard = h.engine.mutex.try_acquire(now).unwrap();

 let outcome = h.engine.run_full_sync(false, false).await.unwrap();
 assert!(!outcome.ran);
 }

 #[tokio::test]
 async fn empty_remote_pull_does_not_advance_the_cursor() {
 let h = harness();
 let kv = Arc::new(InMemoryKeyValueStore::new());
 let engine = SyncEngine::new(
 config(),
 EngineCapabilities {
 local: h.local.clone(),
 remote: h.remote.clone(),
 kv: kv.clone(),
 network: h.network.clone(),
 clock: h.clock.clone(),
 realtime: None,
 },
 );
 engine.set_auth_state(AuthState::Authenticated {
 user_id: UserId::from("u1"),
 expires_at: None,
 });

 engine.run_full_sync(false, false).await.unwrap();
 let cursor_after_first = kv.get("lastSyncCursor_u1").await.unwrap();

 engine.run_full_sync(false, false).await.unwrap();
 let cursor_after_second = kv.get("lastSyncCursor_u1").await.unwrap();

 assert_eq!(cursor_after_first, cursor_after_second);
 }

 #[tokio::test]
 async fn start_runs_hydration_when_the_local_store_is_empty() {
 let h = harness();
 h.remote.seed(
 "goals",
 EntityRecord::new(EntityId::from("g1"), UserId::from("u1"), h.clock.now()),
 );

 h.engine.start().await.unwrap();

 assert!(h.engine.is_hydrated());
 assert!(h.local.get("goals", &EntityId::from("g1")).await.unwrap().is_some());
 }

 #[tokio::test]
 async fn start_reports_schema_errors_and_refuses_to_hydrate() {
 let h = harness();
 // Force a missing-relation style failure so schema validation fails.
 h.remote.fail_next_fetch("relation \"goals\" does not exist");

 let result = h.engine.start().await;
 assert!(matches!(result, Err(EngineError::SchemaInvalid)));
 assert!(!h.engine.is_hydrated());
 }

 #[tokio::test]
 async fn push_only_mode_skips_the_pull_phase_while_realtime_is_connected() {
 let local = Arc::new(InMemoryLocalStore::new());
 let remote = Arc::new(InMemoryRemoteStore::new());
 let kv = Arc::new(InMemoryKeyValueStore::new());
 let network = Arc::new(FakeNetwork::new());
 let clock = Arc::new(FakeClock::new(Utc::now()));
 let channel: Arc<dyn RealtimeChannel> = Arc::new(FakeRealtimeChannel::new());

 remote.seed(
 "goals",
 EntityRecord::new(EntityId::from("g1"), UserId::from("u1"), clock.now()),
 );

 let engine = SyncEngine::new(
 config(),
 EngineCapabilities {
 local: local.clone(),
 remote: remote.clone(),
 kv,
 network,
 clock,
 realtime: Some(channel),
 },
 );
 engine.set_auth_state(AuthState::Authenticated {
 user_id: UserId::from("u1"),
 expires_at: None,
 });

 engine.start().await.unwrap();
 // Realtime connected on subscribe in the fake channel, so the
 // engine's own hydration pull still ran (force_cursor bypasses
 // push-only), but a subsequent scheduled cycle must not re-pull.
 local.seed("goals", {
 let mut r = EntityRecord::new(EntityId::from("g1"), UserId::from("u1"), clock.now());
 r.set_field("current_value", serde_json::json!(1));
 r
 });

 let outcome = engine.run_full_sync(false, false).await.unwrap();
 assert!(outcome.pull_skipped);
 }

 #[tokio::test]
 async fn auth_kicked_clears_the_outbox_by_default() {
 let h = harness();
 h.engine
 .outbox
 .enqueue_set("goals", EntityId::from("g1"), "current_value", serde_json::json!(1), h.clock.now())
 .await;

 h.engine.handle_auth_kicked(false).await;

 assert!(h.engine.outbox.is_empty().await);
 assert!(matches!(h.engine.auth_state(), AuthState::Unauthenticated));
 }

 #[tokio::test]
 async fn auth_kicked_preserves_the_outbox_when_opted_in() {
 let h = harness();
 h.engine
 .outbox
 .enqueue_set("goals", EntityId::from("g1"), "current_value", serde_json::json!(1), h.clock.now())
 .await;

 h.engine.handle_auth_kicked(true).await;

 assert!(!h.engine.outbox.is_empty().await);
 }

 #[tokio::test]
 async fn diagnostics_snapshot_reflects_live_engine_state() {
 let h = harness();
 h.engine
 .outbox
 .enqueue_create("goals", EntityId::from("g1"), serde_json::json!({}), h.clock.now())
 .await;

 let snapshot = h.engine.diagnostics("supabase", "online", true).await;
 assert_eq!(snapshot.queue.pending_count, 1);
 assert!(!snapshot.engine.mutex_held);
 assert_eq!(snapshot.sync.auth_mode, "supabase");
 }

 #[tokio::test]
 async fn stop_force_releases_a_held_mutex_and_clears_hydration() {
 let h = harness();
 h.engine.start().await.unwrap();
 assert!(h.engine.is_hydrated());

 let _guard = h.engine.mutex.try_acquire(h.clock.now()).unwrap();
 h.engine.stop().await.unwrap();

 assert!(!h.engine.mutex.is_held());
 assert!(!h.engine.is_hydrated());
 }

 #[tokio::test]
 async fn clear_local_cache_empties_outbox_and_conflict_history() {
 let h = harness();
 h.engine
 .outbox
 .enqueue_create("goals", EntityId::from("g1"), serde_json::json!({}), h.clock.now())
 .await;

 h.engine.clear_local_cache().await.unwrap();

 assert!(h.engine.outbox.is_empty().await);
 assert!(h.engine.diagnostics("supabase", "online", true).await.conflicts.recent.is_empty());
 }
}
