use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
 #[error("could not determine home directory")]
 NoHomeDir,

 #[error("io error: {0}")]
 Io(#[from] std::io::Error),

 #[error("json error: {0}")]
 Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
