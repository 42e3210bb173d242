use std::path::Path;

use serde::{Deserialize, Serialize};
use sync_types::GateType;

use crate::error::ConfigResult;
use crate::paths::Paths;

pub const DEFAULT_SYNC_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_TOMBSTONE_MAX_AGE_DAYS: i64 = 30;
pub const DEFAULT_VISIBILITY_SYNC_MIN_AWAY_MS: u64 = 60_000;
pub const DEFAULT_ONLINE_RECONNECT_COOLDOWN_MS: u64 = 5_000;
pub const DEFAULT_TRUST_DURATION_DAYS: i64 = 90;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Declares one table the engine keeps in sync, as it appears in the
/// initialization input (the design §6). Converts into `sync_types::TableConfig`
/// via `TableDecl::into_table_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDecl {
 pub name: String,
 pub columns: String,
 #[serde(default)]
 pub ownership_filter: Option<String>,
 #[serde(default)]
 pub is_singleton: bool,
 #[serde(default)]
 pub exclude_from_conflict: Vec<String>,
 #[serde(default)]
 pub numeric_merge_fields: Vec<String>,
}

impl TableDecl {
 pub fn into_table_config(self) -> sync_types::TableConfig {
 let columns = self
 .columns
 .split(',')
 .map(|c| c.trim().to_string())
 .filter(|c| !c.is_empty())
 .collect();

 sync_types::TableConfig {
 name: self.name,
 columns,
 ownership_filter: self.ownership_filter,
 is_singleton: self.is_singleton,
 exclude_from_conflict: self.exclude_from_conflict,
 numeric_merge_fields: self.numeric_merge_fields,
 }
 }
}

/// Single-user gate options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleUserOptions {
 pub gate_type: GateType,
 #[serde(default)]
 pub code_length: Option<u8>,
}

/// OTP device-verification options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceVerificationOptions {
 #[serde(default)]
 pub enabled: bool,
 #[serde(default = "default_trust_duration_days")]
 pub trust_duration_days: i64,
}

fn default_trust_duration_days() -> i64 {
 DEFAULT_TRUST_DURATION_DAYS
}

impl Default for DeviceVerificationOptions {
 fn default() -> Self {
 Self {
 enabled: false,
 trust_duration_days: DEFAULT_TRUST_DURATION_DAYS,
 }
 }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthOptions {
 #[serde(default)]
 pub single_user: Option<SingleUserOptions>,
 #[serde(default)]
 pub device_verification: Option<DeviceVerificationOptions>,
 /// Redirect path appended to `<origin>` for the OTP confirmation link.
 #[serde(default)]
 pub confirm_redirect_path: Option<String>,
}

/// Tuning knobs with the documented defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningKnobs {
 #[serde(default = "default_sync_debounce_ms")]
 pub sync_debounce_ms: u64,
 #[serde(default = "default_sync_interval_ms")]
 pub sync_interval_ms: u64,
 #[serde(default = "default_tombstone_max_age_days")]
 pub tombstone_max_age_days: i64,
 #[serde(default = "default_visibility_sync_min_away_ms")]
 pub visibility_sync_min_away_ms: u64,
 #[serde(default = "default_online_reconnect_cooldown_ms")]
 pub online_reconnect_cooldown_ms: u64,
}

fn default_sync_debounce_ms() -> u64 {
 DEFAULT_SYNC_DEBOUNCE_MS
}
fn default_sync_interval_ms() -> u64 {
 DEFAULT_SYNC_INTERVAL_MS
}
fn default_tombstone_max_age_days() -> i64 {
 DEFAULT_TOMBSTONE_MAX_AGE_DAYS
}
fn default_visibility_sync_min_away_ms() -> u64 {
 DEFAULT_VISIBILITY_SYNC_MIN_AWAY_MS
}
fn default_online_reconnect_cooldown_ms() -> u64 {
 DEFAULT_ONLINE_RECONNECT_COOLDOWN_MS
}

impl Default for TuningKnobs {
 fn default() -> Self {
 Self {
 sync_debounce_ms: DEFAULT_SYNC_DEBOUNCE_MS,
 sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
 tombstone_max_age_days: DEFAULT_TOMBSTONE_MAX_AGE_DAYS,
 visibility_sync_min_away_ms: DEFAULT_VISIBILITY_SYNC_MIN_AWAY_MS,
 online_reconnect_cooldown_ms: DEFAULT_ONLINE_RECONNECT_COOLDOWN_MS,
 }
 }
}

/// The single initialization input the embedder provides to `initEngine`,
/// configuration schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
 /// App-wide namespace for storage keys and multi-tenant device rows.
 pub prefix: String,
 pub tables: Vec<TableDecl>,
 #[serde(default)]
 pub tuning: TuningKnobs,
 #[serde(default)]
 pub auth: AuthOptions,
 /// Whether demo/sandbox mode is active (C8 step 1).
 #[serde(default)]
 pub demo_mode: bool,
 #[serde(default = "default_log_level")]
 pub log_level: String,
}

fn default_log_level() -> String {
 DEFAULT_LOG_LEVEL.to_string()
}

impl SyncConfig {
 pub fn new(prefix: impl Into<String>, tables: Vec<TableDecl>) -> Self {
 Self {
 prefix: prefix.into(),
 tables,
 tuning: TuningKnobs::default(),
 auth: AuthOptions::default(),
 demo_mode: false,
 log_level: DEFAULT_LOG_LEVEL.to_string(),
 }
 }

 pub fn table_configs(&self) -> Vec<sync_types::TableConfig> {
 self.tables
 .iter()
 .cloned()
 .map(TableDecl::into_table_config)
 .collect()
 }

 pub fn table_names(&self) -> Vec<String> {
 self.tables.iter().map(|t| t.name.clone()).collect()
 }

 pub fn load(paths: &Paths) -> ConfigResult<Option<Self>> {
 let path = paths.config_file();
 if !path.exists() {
 return Ok(None);
 }
 Ok(Some(Self::load_from_file(&path)?))
 }

 pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
 let content = std::fs::read_to_string(path)?;
 let mut config: Self = serde_json::from_str(&content)?;
 config.apply_env_overrides();
 Ok(config)
 }

 pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
 paths.ensure_dirs()?;
 let content = serde_json::to_string_pretty(self)?;
 std::fs::write(paths.config_file(), content)?;
 Ok(())
 }

 /// Only `log_level` is overridable at runtime; the rest of the schema is
 /// fixed at `initEngine` time by the embedding application.
 fn apply_env_overrides(&mut self) {
 if let Ok(level) = std::env::var("SYNC_ENGINE_LOG_LEVEL") {
 self.log_level = level;
 }
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use tempfile::tempdir;

 fn sample() -> SyncConfig {
 SyncConfig::new(
 "acme",
 vec![TableDecl {
 name: "goals".into(),
 columns: "id, updated_at, deleted, user_id, current_value, name".into(),
 ownership_filter: Some("user_id".into()),
 is_singleton: false,
 exclude_from_conflict: vec![],
 numeric_merge_fields: vec!["current_value".into()],
 }],
 )
 }

 #[test]
 fn table_decl_splits_columns_and_trims_whitespace() {
 let table = sample().tables.remove(0).into_table_config();
 assert_eq!(
 table.columns,
 vec!["id", "updated_at", "deleted", "user_id", "current_value", "name"]
 );
 }

 #[test]
 fn defaults_match_documented_tuning_knobs() {
 let tuning = TuningKnobs::default();
 assert_eq!(tuning.sync_debounce_ms, 300);
 assert_eq!(tuning.sync_interval_ms, 30_000);
 assert_eq!(tuning.tombstone_max_age_days, 30);
 assert_eq!(tuning.visibility_sync_min_away_ms, 60_000);
 assert_eq!(tuning.online_reconnect_cooldown_ms, 5_000);
 }

 #[test]
 fn save_and_load_round_trip() {
 let dir = tempdir().unwrap();
 let paths = Paths::with_base_dir(dir.path().to_path_buf());

 let config = sample();
 config.save(&paths).unwrap();

 let loaded = SyncConfig::load(&paths).unwrap().expect("config present");
 assert_eq!(loaded.prefix, "acme");
 assert_eq!(loaded.tables.len(), 1);
 }

 #[test]
 fn load_missing_file_returns_none() {
 let dir = tempdir().unwrap();
 let paths = Paths::with_base_dir(dir.path().to_path_buf());
 assert!(SyncConfig::load(&paths).unwrap().is_none());
 }
}
