use sync_capabilities::CapabilityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// The sync mutex could not be acquired before the watchdog ceiling
    /// elapsed. `tokio::sync::Mutex` has no safe forced-unlock primitive, so
    /// this is how a stuck cycle is actually bounded — see `mutex.rs`.
    #[error("sync mutex busy past the watchdog ceiling")]
    MutexStuck,

    /// At least one configured table failed its startup probe
    /// (`sync_schema::validate_schema`); the engine refuses further cycles
    /// until the embedder reconfigures and restarts.
    #[error("schema validation failed for one or more tables, refusing further sync cycles")]
    SchemaInvalid,

    /// The backend rejected the current session outright (not merely
    /// expired). The caller signs out, clears the in-memory auth mode, and
    /// by default drops the outbox unless configured to preserve it.
    #[error("auth session invalid or revoked")]
    AuthKicked,

    /// A sync cycle or cache-clear was attempted before the embedder told
    /// the engine which user is signed in via `SyncEngine::set_auth_state`.
    #[error("sync engine has no authenticated user")]
    NotAuthenticated,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse classification of a capability failure, used to decide whether a
/// push/pull error is worth retrying or should kick the session. String-matched
/// the same way the schema crate's table-probe categorizer works, since
/// `CapabilityError` only carries a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    Transient,
    AuthInvalid,
}

pub(crate) fn classify_capability_error(err: &CapabilityError) -> ErrorKind {
    let message = err.to_string().to_lowercase();
    let looks_like_auth_failure = message.contains("unauthorized")
        || message.contains("unauthenticated")
        || message.contains("invalid token")
        || message.contains("invalid_grant")
        || message.contains("jwt")
        || message.contains("forbidden")
        || message.contains("session") && message.contains("revoked");

    if matches!(err, CapabilityError::Auth(_)) || looks_like_auth_failure {
        ErrorKind::AuthInvalid
    } else {
        ErrorKind::Transient
    }
}
