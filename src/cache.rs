// src/cache.rs
// Single-slot, time-bucketed memoization. One cache per feed; the key is the
// current hour (`timeutil::hour_key`), so expiry is implicit in the key
// changing rather than a TTL sweep.
//
// The slot mutex is held across the compute future. That is deliberate: it
// is the thundering-herd guard — concurrent requests for the same uncached
// hour serialize behind the first caller and reuse its result instead of
// issuing duplicate upstream fetches.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::Mutex;

use crate::error::FeedError;

pub struct HourlyCache<T> {
    name: &'static str,
    slot: Mutex<Option<(String, Arc<T>)>>,
}

impl<T> HourlyCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached value for `key`, or runs `compute` and stores its
    /// result. A new key evicts the previous entry (capacity of one). Failed
    /// computations are not stored, so the next caller retries.
    pub async fn get_or_try_compute<F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> Result<Arc<T>, FeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FeedError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some((cached_key, value)) = slot.as_ref() {
            if cached_key == key {
                counter!("feed_cache_hits_total", "feed" => self.name).increment(1);
                return Ok(Arc::clone(value));
            }
        }

        counter!("feed_cache_misses_total", "feed" => self.name).increment(1);
        let value = Arc::new(compute().await?);
        *slot = Some((key.to_string(), Arc::clone(&value)));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn same_key_computes_once() {
        let cache = HourlyCache::<u32>::new("test");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_try_compute("2025082314", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(*v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_key_evicts_and_recomputes() {
        let cache = HourlyCache::<&'static str>::new("test");

        let v1 = cache
            .get_or_try_compute("h1", || async { Ok("first") })
            .await
            .unwrap();
        let v2 = cache
            .get_or_try_compute("h2", || async { Ok("second") })
            .await
            .unwrap();
        assert_eq!(*v1, "first");
        assert_eq!(*v2, "second");

        // Only one live entry: going back to h1 recomputes.
        let calls = AtomicUsize::new(0);
        let v3 = cache
            .get_or_try_compute("h1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("first-again")
            })
            .await
            .unwrap();
        assert_eq!(*v3, "first-again");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = HourlyCache::<u32>::new("test");

        let err = cache
            .get_or_try_compute("h1", || async {
                Err(FeedError::Aggregation("boom".into()))
            })
            .await;
        assert!(err.is_err());

        let v = cache
            .get_or_try_compute("h1", || async { Ok(1) })
            .await
            .unwrap();
        assert_eq!(*v, 1);
    }
}
