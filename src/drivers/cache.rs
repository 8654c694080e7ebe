use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use log::debug;
use crate::drivers::{DashboardError, DataTable, DataWindowProvider, WindowQuery};
/// Source of "now" for cache freshness.
pub trait Clock {
    fn now(&self) -> Instant;
}
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
struct CacheEntry {
    stored_at: Instant,
    table: DataTable,
}
/// Memoizes window fetches for `ttl`, holding at most `capacity` windows.
///
/// When full, the entry stored longest ago is evicted. Failed fetches are not
/// cached.
pub struct CachedProvider<P, C = SystemClock> {
    inner: P,
    clock: C,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<WindowQuery, CacheEntry>>,
}
impl<P: DataWindowProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(inner, ttl, capacity, SystemClock)
    }
}
impl<P: DataWindowProvider, C: Clock> CachedProvider<P, C> {
    pub fn with_clock(inner: P, ttl: Duration, capacity: usize, clock: C) -> Self {
        Self {
            inner,
            clock,
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }
    pub fn inner(&self) -> &P {
        &self.inner
    }
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
    /// Number of stored windows, fresh or not.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
impl<P: DataWindowProvider, C: Clock> DataWindowProvider for CachedProvider<P, C> {
    fn fetch(&self, query: &WindowQuery) -> Result<DataTable, DashboardError> {
        let now = self.clock.now();
        {
            let entries = self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(entry) = entries.get(query) {
                if now.saturating_duration_since(entry.stored_at) < self.ttl {
                    debug!("cache hit for {}", query.table.table_name());
                    return Ok(entry.table.clone());
                }
            }
        }
        // lock released while the inner provider runs
        let table = self.inner.fetch(query)?;
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) < self.ttl);
        if entries.len() >= self.capacity && !entries.contains_key(query) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| *key);
            if let Some(key) = oldest {
                entries.remove(&key);
            }
        }
        entries.insert(
            *query,
            CacheEntry {
                stored_at: now,
                table: table.clone(),
            },
        );
        Ok(table)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
    use crate::types::TableKind;
    struct ManualClock {
        start: Instant,
        offset: Mutex<Duration>,
    }
    impl ManualClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }
        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }
    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock().unwrap()
        }
    }
    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: Cell<bool>,
    }
    impl DataWindowProvider for CountingProvider {
        fn fetch(&self, _query: &WindowQuery) -> Result<DataTable, DashboardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.get() {
                return Err(DashboardError::Csv("unavailable".into()));
            }
            Ok(DataTable::new(["XOUT", "YOUT", "ZOUT"]))
        }
    }
    fn query(minute: i64) -> WindowQuery {
        let base: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        WindowQuery::new(
            TableKind::Accelerometer,
            base + ChronoDuration::minutes(minute),
            base + ChronoDuration::minutes(minute + 1),
        )
    }
    fn calls(cache: &CachedProvider<CountingProvider, Arc<ManualClock>>) -> usize {
        cache.inner().calls.load(Ordering::SeqCst)
    }
    #[test]
    fn repeated_queries_hit_until_the_ttl_expires() {
        let clock = Arc::new(ManualClock::new());
        let cache = CachedProvider::with_clock(
            CountingProvider::default(),
            Duration::from_secs(180),
            100,
            clock.clone(),
        );
        cache.fetch(&query(0)).unwrap();
        cache.fetch(&query(0)).unwrap();
        assert_eq!(calls(&cache), 1);
        clock.advance(Duration::from_secs(179));
        cache.fetch(&query(0)).unwrap();
        assert_eq!(calls(&cache), 1);
        clock.advance(Duration::from_secs(1));
        cache.fetch(&query(0)).unwrap();
        assert_eq!(calls(&cache), 2);
    }
    #[test]
    fn distinct_windows_are_cached_separately() {
        let cache = CachedProvider::with_clock(
            CountingProvider::default(),
            Duration::from_secs(60),
            10,
            Arc::new(ManualClock::new()),
        );
        cache.fetch(&query(0)).unwrap();
        cache.fetch(&query(1)).unwrap();
        cache.fetch(&query(0)).unwrap();
        assert_eq!(calls(&cache), 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
        cache.fetch(&query(0)).unwrap();
        assert_eq!(calls(&cache), 3);
    }
    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let clock = Arc::new(ManualClock::new());
        let cache = CachedProvider::with_clock(
            CountingProvider::default(),
            Duration::from_secs(600),
            2,
            clock.clone(),
        );
        cache.fetch(&query(0)).unwrap();
        clock.advance(Duration::from_secs(1));
        cache.fetch(&query(1)).unwrap();
        clock.advance(Duration::from_secs(1));
        cache.fetch(&query(2)).unwrap();
        assert_eq!(cache.len(), 2);
        cache.fetch(&query(1)).unwrap();
        assert_eq!(calls(&cache), 3);
        cache.fetch(&query(0)).unwrap();
        assert_eq!(calls(&cache), 4);
    }
    #[test]
    fn failures_are_not_cached() {
        let cache = CachedProvider::with_clock(
            CountingProvider::default(),
            Duration::from_secs(60),
            10,
            Arc::new(ManualClock::new()),
        );
        cache.inner().fail.set(true);
        assert!(cache.fetch(&query(0)).is_err());
        assert!(cache.is_empty());
        cache.inner().fail.set(false);
        assert!(cache.fetch(&query(0)).is_ok());
        assert_eq!(calls(&cache), 2);
    }
}
