//! One-shot capability probe against every configured table: a zero-row read scoped by ownership, categorized as
//! missing-relation, permission-denied, or other. Runs once at engine start
//! and gates whether the engine progresses beyond hydration; it must not
//! fetch user data, so every probe uses `limit(0)`.

use sync_capabilities::{CapabilityError, FetchParams, RemoteStore};
use sync_types::{TableConfig, UserId};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableProbeFailure {
 MissingRelation(String),
 PermissionDenied(String),
 Other(String),
}

impl TableProbeFailure {
 fn categorize(message: &str) -> Self {
 let lower = message.to_lowercase();
 if lower.contains("does not exist")
 || lower.contains("no such table")
 || lower.contains("undefined_table")
 || lower.contains("relation")
 {
 TableProbeFailure::MissingRelation(message.to_string())
 } else if lower.contains("permission denied")
 || lower.contains("insufficient_privilege")
 || lower.contains("row-level security")
 || lower.contains("rls")
 {
 TableProbeFailure::PermissionDenied(message.to_string())
 } else {
 TableProbeFailure::Other(message.to_string())
 }
 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProbeResult {
 pub table: String,
 pub failure: Option<TableProbeFailure>,
}

impl TableProbeResult {
 pub fn is_ok(&self) -> bool {
 self.failure.is_none()
 }
}

/// Outcome of probing every configured table. The engine is clear to proceed
/// past hydration only when `all_ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationReport {
 pub results: Vec<TableProbeResult>,
}

impl SchemaValidationReport {
 pub fn all_ok(&self) -> bool {
 self.results.iter().all(TableProbeResult::is_ok)
 }

 pub fn failures(&self) -> Vec<&TableProbeResult> {
 self.results.iter().filter(|r| !r.is_ok()).collect()
 }
}

/// Probes every table in `tables` with a `select id limit 0` scoped to
/// `user_id`, run once at engine start.
pub async fn validate_schema(
 remote: &dyn RemoteStore,
 tables: &[TableConfig],
 user_id: &UserId,
) -> SchemaValidationReport {
 let mut results = Vec::with_capacity(tables.len());

 for table in tables {
 let params = FetchParams::new(table.name.clone(), vec!["id".to_string()])
 .with_owner(user_id.clone());
 let params = FetchParams { limit: Some(0), ..params };

 let failure = match remote.fetch(params).await {
 Ok(_) => None,
 Err(err) => {
 let message = probe_error_message(&err);
 warn!(table = %table.name, error = %message, "schema probe failed");
 Some(TableProbeFailure::categorize(&message))
 }
 };

 if failure.is_none() {
 info!(table = %table.name, "schema probe ok");
 }

 results.push(TableProbeResult {
 table: table.name.clone(),
 failure,
 });
 }

 SchemaValidationReport { results }
}

fn probe_error_message(err: &CapabilityError) -> String {
 match err {
 CapabilityError::RemoteStore(msg) => msg.clone(),
 other => other.to_string(),
 }
}
