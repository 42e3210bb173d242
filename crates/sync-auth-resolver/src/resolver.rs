//! On-boot and on-reconnect auth resolution: decides which
//! authenticated mode the app runs in, walking the ordered decision table
//! and failing closed — any error along the way purges storage and returns
//! `none` rather than leaving the user permanently locked out.

use chrono::{DateTime, Utc};
use serde_json::Map;
use serde_json::Value;
use sync_auth::{clear_offline_state, load_offline_session, load_single_user_config};
use sync_capabilities::{AuthProvider, BackendSession, KeyValueStore, LocalStore, Network, RemoteStore};
use sync_types::UserId;
use tracing::warn;

use crate::error::ResolverResult;
use crate::lock::is_locked;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
 Supabase,
 Offline,
 Demo,
 None,
}

/// Synthesized from the cached single-user config when the app starts
/// offline with no reachable backend session — enough to render the UI
/// without a network round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineProfile {
 pub user_id: UserId,
 pub email: String,
 pub profile: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAuth {
 pub session: Option<BackendSession>,
 pub mode: AuthMode,
 pub offline_profile: Option<OfflineProfile>,
 pub server_configured: bool,
}

impl ResolvedAuth {
 fn none(server_configured: bool) -> Self {
 Self {
 session: None,
 mode: AuthMode::None,
 offline_profile: None,
 server_configured,
 }
 }

 fn demo() -> Self {
 Self {
 session: None,
 mode: AuthMode::Demo,
 offline_profile: None,
 server_configured: true,
 }
 }

 fn supabase(session: BackendSession) -> Self {
 Self {
 session: Some(session),
 mode: AuthMode::Supabase,
 offline_profile: None,
 server_configured: true,
 }
 }

 fn offline(profile: OfflineProfile) -> Self {
 Self {
 session: None,
 mode: AuthMode::Offline,
 offline_profile: Some(profile),
 server_configured: true,
 }
 }
}

fn demo_mode_key(prefix: &str) -> String {
 format!("{prefix}_demo_mode")
}

/// Resolves the app's auth state on boot or reconnect. Never returns an
/// error: any failure along the decision table purges local/kv storage and
/// degrades to `{ none, false }` rather than propagating.
pub async fn resolve_auth_state(
 local: &dyn LocalStore,
 remote: &dyn RemoteStore,
 auth: &dyn AuthProvider,
 kv: &dyn KeyValueStore,
 network: &dyn Network,
 prefix: &str,
 expected_code_length: Option<u8>,
 now: DateTime<Utc>,
) -> ResolvedAuth {
 match resolve_inner(local, remote, auth, kv, network, prefix, expected_code_length, now).await {
 Ok(resolved) => resolved,
 Err(err) => {
 warn!(error = %err, "auth state resolution failed, purging storage");
 purge_backend_storage(local, kv, prefix).await;
 ResolvedAuth::none(false)
 }
 }
}

async fn resolve_inner(
 local: &dyn LocalStore,
 remote: &dyn RemoteStore,
 auth: &dyn AuthProvider,
 kv: &dyn KeyValueStore,
 network: &dyn Network,
 prefix: &str,
 expected_code_length: Option<u8>,
 now: DateTime<Utc>,
) -> ResolverResult<ResolvedAuth> {
 // Step 1: demo mode short-circuits everything else.
 if kv.get(&demo_mode_key(prefix)).await?.as_deref() == Some("true") {
 return Ok(ResolvedAuth::demo());
 }

 // Step 2: await local-store open.
 local.wait_for_db().await?;

 // Steps 3-4: load and validate the single-user config.
 let mut config = match load_single_user_config(local).await? {
 None => return Ok(ResolvedAuth::none(false)),
 Some(config) => config,
 };

 let Some(email) = config.email.clone() else {
 // Legacy config predating the email field: unusable, purge and
 // report first-run.
 clear_offline_state(local).await?;
 return Ok(ResolvedAuth::none(false));
 };

 if expected_code_length.is_some() && config.code_length != expected_code_length {
 if let Some(user_id) = config.remote_user_id.clone() {
 remote.rpc_reset(&user_id).await?;
 }
 let _ = auth.sign_out().await;
 clear_offline_state(local).await?;
 return Ok(ResolvedAuth::none(false));
 }

 if is_locked(local).await? {
 return Ok(ResolvedAuth::none(true));
 }

 // Step 5: read the backend session, refreshing an expired one while online.
 let mut session = auth.current_session().await?;
 if let Some(current) = &session {
 if current.is_expired(now) && network.is_online() {
 match auth.refresh(&current.refresh_token).await {
 Ok(refreshed) => session = Some(refreshed),
 Err(err) => warn!(error = %err, "session refresh failed, falling back to cached session"),
 }
 }
 }

 // Step 6: a valid (non-expired) session wins outright.
 if let Some(current) = &session {
 if !current.is_expired(now) {
 return Ok(ResolvedAuth::supabase(current.clone()));
 }
 }

 // Step 7: offline fallbacks.
 if let Some(current) = session {
 // Even expired, a cached backend session still counts as "supabase"
 // mode — the gate UI treats it as logged-in-but-stale rather than
 // logged-out.
 return Ok(ResolvedAuth::supabase(current));
 }

 if let Some(offline_session) = load_offline_session(local).await? {
 if config.remote_user_id.as_ref() == Some(&offline_session.user_id) {
 let profile = OfflineProfile {
 user_id: offline_session.user_id,
 email,
 profile: std::mem::take(&mut config.profile),
 };
 return Ok(ResolvedAuth::offline(profile));
 }
 }

 // Step 8: no session, no offline fallback — locked.
 Ok(ResolvedAuth::none(true))
}

async fn purge_backend_storage(local: &dyn LocalStore, kv: &dyn KeyValueStore, prefix: &str) {
 if let Err(err) = clear_offline_state(local).await {
 warn!(error = %err, "failed to clear offline state during corrupted-storage recovery");
 }
 match kv.list_keys_with_prefix(prefix).await {
 Ok(keys) => {
 for key in keys {
 if let Err(err) = kv.remove(&key).await {
 warn!(error = %err, key = %key, "failed to purge prefixed key");
 }
 }
 }
 Err(err) => warn!(error = %err, "failed to list prefixed keys during purge"),
 }
}
