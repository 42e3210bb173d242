use chrono::{DateTime, Utc};
use sync_capabilities::Crypto;

use crate::backoff::GateCounters;

/// Which path the caller should take after a pre-check decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreCheckStrategy {
 /// The hashed gate matched the cached local hash; proceed to the
 /// backend sign-in call.
 LocalMatch,
 /// No local hash was cached; the backoff window has elapsed, proceed
 /// to the backend call.
 NoLocalHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheckOutcome {
 Proceed(PreCheckStrategy),
 /// Rejected without calling the backend. `invalidate_hash` is set once
 /// the local-failure threshold is crossed on this attempt.
 RejectedLocally { invalidate_hash: bool },
 RateLimited { retry_after_ms: u64 },
}

/// Hashes `gate` and decides whether the caller should attempt a backend
/// sign-in, reject locally, or wait out a backoff window.
///
/// `cached_hash` is `None` both when no hash was ever cached and when it
/// was invalidated by a prior threshold crossing — both cases fall through
/// to the backoff path.
pub fn pre_check(
 cached_hash: Option<&str>,
 gate: &str,
 crypto: &dyn Crypto,
 now: DateTime<Utc>,
 counters: &mut GateCounters,
) -> PreCheckOutcome {
 let hash = crypto.sha256_hex(gate);

 match cached_hash {
 Some(cached) if cached == hash => PreCheckOutcome::Proceed(PreCheckStrategy::LocalMatch),
 Some(_) => {
 let invalidate_hash = counters.record_local_mismatch();
 PreCheckOutcome::RejectedLocally { invalidate_hash }
 }
 None => {
 if counters.is_rate_limited(now) {
 PreCheckOutcome::RateLimited {
 retry_after_ms: counters.retry_after_ms(now),
 }
 } else {
 PreCheckOutcome::Proceed(PreCheckStrategy::NoLocalHash)
 }
 }
 }
}

/// Wraps [`pre_check`], but treats any failure to read the cached hash as
/// "fail open": a corrupted local store must not lock a user out of their
/// own account, so reading errors proceed straight to the backend rather
/// than rejecting.
pub fn pre_check_fail_open<E>(
 cached_hash: Result<Option<String>, E>,
 gate: &str,
 crypto: &dyn Crypto,
 now: DateTime<Utc>,
 counters: &mut GateCounters,
) -> PreCheckOutcome {
 match cached_hash {
 Ok(cached) => pre_check(cached.as_deref(), gate, crypto, now, counters),
 Err(_) => PreCheckOutcome::Proceed(PreCheckStrategy::NoLocalHash),
 }
}
