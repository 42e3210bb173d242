/// Capped exponential reconnect backoff. After `error_ceiling` consecutive
/// failures the engine surfaces a connection-state `error` to diagnostics
/// but keeps retrying at the capped delay rather than giving up — realtime
/// is an optimization over pull-on-schedule, not a requirement.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
 pub base_delay_ms: u64,
 pub multiplier: u64,
 pub max_delay_ms: u64,
 pub error_ceiling: u32,
}

impl Default for ReconnectPolicy {
 fn default() -> Self {
 Self {
 base_delay_ms: 1_000,
 multiplier: 2,
 max_delay_ms: 60_000,
 error_ceiling: 6,
 }
 }
}

impl ReconnectPolicy {
 /// `min(base * multiplier^(attempt-1), max)`, `attempt` 1-indexed.
 pub fn delay_ms(&self, attempt: u32) -> u64 {
 let shift = attempt.saturating_sub(1).min(20);
 let factor = self.multiplier.saturating_pow(shift);
 self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms)
 }
}

/// Per-connection reconnect attempt counter.
#[derive(Debug, Clone, Default)]
pub struct ReconnectState {
 attempts: u32,
}

impl ReconnectState {
 pub fn new() -> Self {
 Self::default()
 }

 pub fn reset(&mut self) {
 self.attempts = 0;
 }

 pub fn attempts(&self) -> u32 {
 self.attempts
 }

 /// Records a failed connect/reconnect attempt, returning the delay
 /// before the next try.
 pub fn record_failure(&mut self, policy: &ReconnectPolicy) -> u64 {
 self.attempts += 1;
 policy.delay_ms(self.attempts)
 }

 pub fn has_reached_error_ceiling(&self, policy: &ReconnectPolicy) -> bool {
 self.attempts >= policy.error_ceiling
 }
}
