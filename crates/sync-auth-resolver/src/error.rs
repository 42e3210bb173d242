use sync_capabilities::CapabilityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
 #[error(transparent)]
 Capability(#[from] CapabilityError),

 #[error(transparent)]
 Auth(#[from] sync_auth::AuthError),

 #[error("corrupted auth storage: {0}")]
 Corrupt(String),
}

pub type ResolverResult<T> = Result<T, ResolverError>;
