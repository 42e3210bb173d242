//! The single-writer sync mutex: at most one sync
//! cycle runs at a time, and an attempt while the mutex is held is a no-op
//! rather than a queued wait — the caller relies on the next scheduled or
//! debounced cycle to pick up whatever changed.
//!
//! Built on `std::sync::Mutex<Option<DateTime<Utc>>>` rather than
//! `tokio::sync::Mutex` — see `error.rs`'s note on `EngineError::MutexStuck`.
//! `tokio::sync::Mutex` has no safe way for a third party (the watchdog) to
//! force an unlock; a plain `std::sync::Mutex` guarding the "held since"
//! timestamp does, since releasing it is just overwriting that `Option` to
//! `None` under the lock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

pub struct SyncMutexGuard<'a> {
    mutex: &'a SyncMutex,
}

impl Drop for SyncMutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

#[derive(Default)]
pub struct SyncMutex {
    held_since: Mutex<Option<DateTime<Utc>>>,
    stuck_count: AtomicU32,
}

impl SyncMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the mutex, stamping `now` as the moment it was
    /// taken. Returns `None` if another cycle already holds it — an
    /// attempt while the mutex is held is a no-op, not a queue.
    pub fn try_acquire(&self, now: DateTime<Utc>) -> Option<SyncMutexGuard<'_>> {
        let mut held = self.held_since.lock().unwrap();
        if held.is_some() {
            return None;
        }
        *held = Some(now);
        Some(SyncMutexGuard { mutex: self })
    }

    fn release(&self) {
        *self.held_since.lock().unwrap() = None;
    }

    /// Unconditional release used when stopping the engine, which must tear
    /// down a held mutex on shutdown without counting it as a watchdog
    /// anomaly — that counter means "a cycle got stuck", not "we shut down
    /// mid-cycle".
    pub fn release_unconditionally(&self) {
        *self.held_since.lock().unwrap() = None;
    }

    pub fn held_since(&self) -> Option<DateTime<Utc>> {
        *self.held_since.lock().unwrap()
    }

    pub fn is_held(&self) -> bool {
        self.held_since.lock().unwrap().is_some()
    }

    /// The watchdog's only path to clearing a stuck lock. If the mutex has
    /// been held longer than `ceiling`, force-releases it and bumps the
    /// anomaly counter, reporting `true` so the caller can log it.
    pub fn watchdog_check(&self, now: DateTime<Utc>, ceiling: chrono::Duration) -> bool {
        let mut held = self.held_since.lock().unwrap();
        match *held {
            Some(since) if now - since > ceiling => {
                *held = None;
                self.stuck_count.fetch_add(1, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    pub fn anomaly_count(&self) -> u32 {
        self.stuck_count.load(Ordering::SeqCst)
    }
}
