// Time-expiring cache for read-query results
use crate::application::vital_repository::VitalRow;
use crate::domain::vitals::{Bed, MetricType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const CACHE_EXPIRY: Duration = Duration::from_secs(5 * 60);

/// Canonical cache key built from normalized query parameters, so identical
/// queries always hit the same entry regardless of how they were assembled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub metric: MetricType,
    pub bed: Bed,
    pub start_ms: i64,
    pub end_ms: i64,
    pub cursor_ms: Option<i64>,
}

impl QueryKey {
    pub fn new(
        metric: MetricType,
        bed: Bed,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cursor: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            metric,
            bed,
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
            cursor_ms: cursor.map(|c| c.timestamp_millis()),
        }
    }
}

/// One cached page of query results.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub rows: Vec<VitalRow>,
    pub total: usize,
    pub has_more: bool,
}

struct Slot {
    page: CachedPage,
    created: Instant,
}

/// Process-wide read cache. Entries older than the expiry window are treated
/// as absent and evicted on lookup; `clear` drops everything after bulk
/// writes or deletes.
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, Slot>>,
    expiry: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_expiry(CACHE_EXPIRY)
    }

    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry,
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<CachedPage> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(slot) if slot.created.elapsed() < self.expiry => Some(slot.page.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: QueryKey, page: CachedPage) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Slot {
                page,
                created: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(cursor_ms: Option<i64>) -> QueryKey {
        QueryKey {
            metric: MetricType::HeartRate,
            bed: Bed(1),
            start_ms: 0,
            end_ms: 60_000,
            cursor_ms,
        }
    }

    fn page(total: usize) -> CachedPage {
        CachedPage {
            rows: Vec::new(),
            total,
            has_more: false,
        }
    }

    #[test]
    fn test_set_then_get() {
        let cache = QueryCache::new();
        cache.set(key(None), page(42));
        let hit = cache.get(&key(None)).unwrap();
        assert_eq!(hit.total, 42);
    }

    #[test]
    fn test_distinct_cursors_are_distinct_entries() {
        let cache = QueryCache::new();
        cache.set(key(None), page(1));
        cache.set(key(Some(30_000)), page(2));
        assert_eq!(cache.get(&key(None)).unwrap().total, 1);
        assert_eq!(cache.get(&key(Some(30_000))).unwrap().total, 2);
    }

    #[test]
    fn test_expired_entry_is_absent_and_evicted() {
        let cache = QueryCache::with_expiry(Duration::from_millis(20));
        cache.set(key(None), page(1));
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get(&key(None)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = QueryCache::new();
        cache.set(key(None), page(1));
        cache.set(key(Some(30_000)), page(2));
        cache.clear();
        assert!(cache.get(&key(None)).is_none());
        assert!(cache.get(&key(Some(30_000))).is_none());
    }
}
