use sync_capabilities::CapabilityError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
 #[error("incorrect password or code")]
 IncorrectGate,

 #[error("rate limited, retry after {retry_after_ms}ms")]
 RateLimited { retry_after_ms: u64 },

 #[error("no cached offline session for this device")]
 NoOfflineSession,

 #[error("device verification required")]
 DeviceVerificationRequired,

 #[error(transparent)]
 Capability(#[from] CapabilityError),

 #[error("corrupt local record: {0}")]
 CorruptRecord(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
