use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutboxError {
 #[error("invariant violated: {0}")]
 InvalidOperation(String),

 #[error("json error: {0}")]
 Json(#[from] serde_json::Error),
}

pub type OutboxResult<T> = Result<T, OutboxError>;
