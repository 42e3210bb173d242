use chrono::{DateTime, Utc};

/// Consecutive local-hash mismatches before the cached hash is invalidated
/// as stale.
pub const LOCAL_FAILURE_THRESHOLD: u32 = 5;

const BASE_DELAY_MS: u64 = 1_000;
const BACKOFF_MULTIPLIER: u64 = 2;
const MAX_DELAY_MS: u64 = 30_000;

/// `min(BASE_DELAY * BACKOFF^(attempts-1), MAX_DELAY)`, in milliseconds.
/// `attempts` is 1-indexed: the delay computed after the Nth no-cache
/// failure gates the (N+1)th attempt.
pub fn compute_backoff_ms(attempts: u32) -> u64 {
 let shift = attempts.saturating_sub(1).min(20);
 let multiplier = BACKOFF_MULTIPLIER.saturating_pow(shift);
 BASE_DELAY_MS.saturating_mul(multiplier).min(MAX_DELAY_MS)
}

/// In-memory, per-gate-instance counters. Reset in full on a successful
/// backend sign-in; the local-failure count alone resets when the cached
/// hash is (re)written after a fresh sign-in.
#[derive(Debug, Clone, Default)]
pub struct GateCounters {
 pub local_failure_count: u32,
 pub backend_attempts: u32,
 pub next_allowed_attempt: Option<DateTime<Utc>>,
}

impl GateCounters {
 pub fn new() -> Self {
 Self::default()
 }

 pub fn reset(&mut self) {
 *self = Self::default();
 }

 /// Records a local-hash mismatch. Returns `true` once the mismatch
 /// count has reached [`LOCAL_FAILURE_THRESHOLD`], signaling the caller
 /// should invalidate the cached hash.
 pub fn record_local_mismatch(&mut self) -> bool {
 self.local_failure_count += 1;
 self.local_failure_count >= LOCAL_FAILURE_THRESHOLD
 }

 /// Records a backend attempt made with no local hash available,
 /// scheduling the next allowed attempt.
 pub fn record_no_cache_failure(&mut self, now: DateTime<Utc>) {
 self.backend_attempts += 1;
 let delay_ms = compute_backoff_ms(self.backend_attempts);
 self.next_allowed_attempt = Some(now + chrono::Duration::milliseconds(delay_ms as i64));
 }

 /// `true` while a scheduled backoff window has not yet elapsed.
 pub fn is_rate_limited(&self, now: DateTime<Utc>) -> bool {
 self.next_allowed_attempt.map(|next| now < next).unwrap_or(false)
 }

 pub fn retry_after_ms(&self, now: DateTime<Utc>) -> u64 {
 self.next_allowed_attempt
 .map(|next| (next - now).num_milliseconds().max(0) as u64)
 .unwrap_or(0)
 }
}
