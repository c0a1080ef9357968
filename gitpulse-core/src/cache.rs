//! Generic TTL cache with single-flight refresh
//!
//! Each keyed entry moves through `Fresh -> Stale -> Refreshing -> Fresh`.
//! The first reader of a stale entry performs the refresh; readers arriving
//! while a refresh is in flight get the stale value immediately and never
//! block. A failed refresh leaves the entry stale so the next read retries.
//!
//! One instance per dataset: branch snapshot, spec listing, compare results.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::Result;

struct Entry<V> {
    value: Option<V>,
    refreshed_at: Option<Instant>,
    refreshing: bool,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            value: None,
            refreshed_at: None,
            refreshing: false,
        }
    }
}

impl<V> Entry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.refreshed_at
            .map(|t| t.elapsed() < ttl)
            .unwrap_or(false)
    }
}

/// Keyed TTL cache with at-most-one concurrent refresh per key
///
/// The entry map sits behind a `std::sync::Mutex` and is never held across
/// an await; refreshes run outside the lock.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
    /// Wakes readers parked on an entry that has no value yet
    populated: Notify,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache where entries stay fresh for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            populated: Notify::new(),
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().expect("cache state lock poisoned")
    }

    /// Get the cached value for `key`, refreshing it if stale
    ///
    /// `refresh` is invoked by at most one caller at a time per key. Callers
    /// that find a refresh already in flight receive the previous (stale)
    /// value without waiting; only the very first population of a key makes
    /// other readers wait, since there is nothing stale to serve yet.
    ///
    /// If the refresh fails and a stale value exists, the stale value is
    /// returned and the failure logged; the entry stays stale so the next
    /// read retries. A refreshing caller whose future is dropped mid-flight
    /// releases its single-flight claim, so the next read can refresh.
    pub async fn get_or_refresh<F, Fut>(&self, key: K, refresh: F) -> Result<V>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        loop {
            let notified = self.populated.notified();
            tokio::pin!(notified);

            // The guard must be dropped on every path before any await so
            // the returned future stays `Send`; awaiting happens only after
            // this block ends.
            let claimed = {
                let mut entries = self.lock_entries();
                let entry = entries.entry(key.clone()).or_default();

                if entry.is_fresh(self.ttl) {
                    if let Some(value) = entry.value.clone() {
                        tracing::debug!("cache hit, entry fresh");
                        return Ok(value);
                    }
                }

                if entry.refreshing {
                    // Serve stale rather than block behind the in-flight
                    // refresh. Only a never-populated key has to wait.
                    if let Some(value) = entry.value.clone() {
                        return Ok(value);
                    }
                    // Register for wakeup while still holding the lock so a
                    // completion between unlock and await is not lost.
                    notified.as_mut().enable();
                    false
                } else {
                    entry.refreshing = true;
                    true
                }
            };

            if claimed {
                let claim = RefreshClaim {
                    cache: self,
                    key: Some(key),
                };
                let result = refresh().await;
                return claim.complete(result);
            }

            notified.await;
        }
    }

    /// Mark the entry for `key` as stale
    ///
    /// The value is kept for serve-stale reads; the next `get_or_refresh`
    /// triggers exactly one fresh refresh even inside the TTL window.
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.lock_entries();
        if let Some(entry) = entries.get_mut(key) {
            entry.refreshed_at = None;
        }
    }
}

/// The single-flight claim held while a refresh runs
///
/// Dropped without completing when the refreshing caller is cancelled
/// mid-flight; the claim is released and waiters are woken so the next
/// reader can take over. The entry stays stale either way.
struct RefreshClaim<'a, K: Eq + Hash + Clone, V: Clone> {
    cache: &'a TtlCache<K, V>,
    key: Option<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> RefreshClaim<'_, K, V> {
    fn complete(mut self, result: Result<V>) -> Result<V> {
        let Some(key) = self.key.take() else {
            return result;
        };
        let mut entries = self.cache.lock_entries();
        let entry = entries.entry(key).or_default();
        entry.refreshing = false;

        match result {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.refreshed_at = Some(Instant::now());
                self.cache.populated.notify_waiters();
                Ok(value)
            }
            Err(e) => {
                // Entry stays stale; the next reader retries the refresh.
                self.cache.populated.notify_waiters();
                if let Some(value) = entry.value.clone() {
                    tracing::warn!(error = %e, "cache refresh failed, serving stale value");
                    Ok(value)
                } else {
                    Err(e)
                }
            }
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Drop for RefreshClaim<'_, K, V> {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else { return };
        if let Ok(mut entries) = self.cache.entries.lock() {
            if let Some(entry) = entries.get_mut(&key) {
                entry.refreshing = false;
            }
        }
        self.cache.populated.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::Error;

    fn counting_refresh(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<u32>> + Send>> {
        let calls = calls.clone();
        move || {
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            })
        }
    }

    #[tokio::test]
    async fn test_reads_within_ttl_refresh_once() {
        let cache: TtlCache<(), u32> = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let v = cache.get_or_refresh((), counting_refresh(&calls, 7)).await.unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_single_flight() {
        let cache: Arc<TtlCache<(), u32>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh((), move || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(99)
                        }
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_served_while_refreshing() {
        let cache: Arc<TtlCache<(), u32>> = Arc::new(TtlCache::new(Duration::from_millis(0)));
        let calls = Arc::new(AtomicUsize::new(0));

        // Populate, entry is immediately stale (zero TTL)
        cache.get_or_refresh((), counting_refresh(&calls, 1)).await.unwrap();

        // Kick off a slow refresh in the background
        let slow_cache = cache.clone();
        let slow = tokio::spawn(async move {
            slow_cache
                .get_or_refresh((), || async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(2)
                })
                .await
                .unwrap()
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Reader during the refresh gets the old value without waiting
        let v = cache.get_or_refresh((), counting_refresh(&calls, 3)).await.unwrap();
        assert_eq!(v, 1);
        assert_eq!(slow.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_stays_stale_and_retries() {
        let cache: TtlCache<(), u32> = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_refresh((), counting_refresh(&calls, 5)).await.unwrap();
        cache.invalidate(&());

        // Failing refresh serves the stale value
        let v = cache
            .get_or_refresh((), || async { Err(Error::Other("boom".into())) })
            .await
            .unwrap();
        assert_eq!(v, 5);

        // Entry is still stale, so the next read refreshes again
        cache.get_or_refresh((), counting_refresh(&calls, 6)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_population_failure_surfaces_error() {
        let cache: TtlCache<(), u32> = TtlCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_refresh((), || async { Err(Error::Other("no repo".into())) })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh_within_ttl() {
        let cache: TtlCache<(), u32> = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_refresh((), counting_refresh(&calls, 1)).await.unwrap();
        cache.invalidate(&());
        cache.get_or_refresh((), counting_refresh(&calls, 2)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_refresh_releases_single_flight() {
        let cache: Arc<TtlCache<(), u32>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_refresh((), counting_refresh(&calls, 1)).await.unwrap();
        cache.invalidate(&());

        // A reader starts a refresh and is aborted while it sleeps
        let doomed_cache = cache.clone();
        let doomed = tokio::spawn(async move {
            doomed_cache
                .get_or_refresh((), || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(2)
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        doomed.abort();
        assert!(doomed.await.unwrap_err().is_cancelled());

        // The aborted reader must not leave the entry claiming a refresh:
        // the next read performs its own refresh and sees the new value
        let v = cache.get_or_refresh((), counting_refresh(&calls, 3)).await.unwrap();
        assert_eq!(v, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_first_population_wakes_waiters() {
        let cache: Arc<TtlCache<(), u32>> = Arc::new(TtlCache::new(Duration::from_secs(60)));

        // First reader claims the initial population and is aborted
        let doomed_cache = cache.clone();
        let doomed = tokio::spawn(async move {
            doomed_cache
                .get_or_refresh((), || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(1)
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Second reader has nothing stale to serve and parks
        let parked_cache = cache.clone();
        let parked = tokio::spawn(async move {
            parked_cache.get_or_refresh((), || async { Ok(7) }).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        doomed.abort();
        assert_eq!(parked.await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_composite_keys_are_independent() {
        let cache: TtlCache<(String, String), u32> = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let key_a = ("main".to_string(), "feature/x".to_string());
        let key_b = ("main".to_string(), "feature/y".to_string());
        cache.get_or_refresh(key_a.clone(), counting_refresh(&calls, 1)).await.unwrap();
        cache.get_or_refresh(key_b, counting_refresh(&calls, 2)).await.unwrap();
        cache.get_or_refresh(key_a, counting_refresh(&calls, 3)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
