//! Debounced push scheduling: repeated
//! calls within the debounce window coalesce into a single eventual cycle
//! rather than firing once per call, mirroring the batching-on-a-ticker
//! shape of a retry worker's flush loop but triggered by local writes
//! instead of a fixed interval.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct PushScheduler {
    generation: Arc<AtomicU64>,
    debounce: Duration,
}

impl PushScheduler {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            debounce: Duration::from_millis(debounce_ms),
        }
    }

    /// Schedules `run` after the debounce window. A call that lands before
    /// the window elapses resets the timer — only the most recent call
    /// actually fires `run`, and only once.
    pub fn schedule<F, Fut>(&self, run: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.clone();
        let my_generation = generation.fetch_add(1, Ordering::SeqCst) + 1;
        let wait = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            if generation.load(Ordering::SeqCst) == my_generation {
                run().await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn a_single_call_fires_after_the_debounce_window() {
        let scheduler = PushScheduler::new(20);
        let fired = Arc::new(AtomicUsize::new(0));
        let marker = fired.clone();
        scheduler.schedule(move || async move {
            marker.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_calls_within_the_window_coalesce_into_one_run() {
        let scheduler = PushScheduler::new(40);
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let marker = fired.clone();
            scheduler.schedule(move || async move {
                marker.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
