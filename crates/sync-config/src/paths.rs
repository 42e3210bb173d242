use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

/// File system locations used by a host process embedding the sync engine.
///
/// Only the config file lives under here today; the local store, key-value
/// store, and any on-disk queues are owned by the embedder's `LocalStore` /
/// `KeyValueStore` implementations, not by this crate.
#[derive(Debug, Clone)]
pub struct Paths {
 base_dir: PathBuf,
}

impl Paths {
 /// Uses `~/.<prefix>` for the config file.
 pub fn new(prefix: &str) -> ConfigResult<Self> {
 let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
 Ok(Self {
 base_dir: home.join(format!(".{prefix}")),
 })
 }

 pub fn with_base_dir(base_dir: PathBuf) -> Self {
 Self { base_dir }
 }

 pub fn base_dir(&self) -> &PathBuf {
 &self.base_dir
 }

 pub fn config_file(&self) -> PathBuf {
 self.base_dir.join("sync-config.json")
 }

 pub fn ensure_dirs(&self) -> ConfigResult<()> {
 std::fs::create_dir_all(&self.base_dir)?;
 Ok(())
 }
}
