// Paginated reads and deletes over the sink, with caching
use crate::application::vital_repository::{ReadQuery, VitalRepository, VitalRow};
use crate::domain::vitals::{Bed, MetricType};
use crate::error::Result;
use crate::infrastructure::cache::{CachedPage, QueryCache, QueryKey};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const PAGE_SIZE: usize = 100;

/// Aggregates shown next to a page of results.
#[derive(Debug, Clone)]
pub struct PageStats {
    pub total: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct VitalPage {
    pub rows: Vec<VitalRow>,
    pub stats: PageStats,
    pub has_more: bool,
    pub next_cursor: Option<DateTime<Utc>>,
}

/// Read-side use cases: cached pagination and deletes that invalidate the
/// cache.
pub struct VitalQueryService {
    repository: Arc<dyn VitalRepository>,
    cache: Arc<QueryCache>,
    page_size: usize,
}

impl VitalQueryService {
    pub fn new(repository: Arc<dyn VitalRepository>, cache: Arc<QueryCache>) -> Self {
        Self {
            repository,
            cache,
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch one page of stored readings. Pagination asks the sink for one
    /// row beyond the page size; the extra row's presence is the has-more
    /// signal and its predecessor's timestamp becomes the next cursor.
    pub async fn fetch_page(
        &self,
        metric: MetricType,
        bed: Bed,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<VitalPage> {
        let key = QueryKey::new(metric, bed, start, end, cursor);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(metric = %metric, bed = %bed, "read cache hit");
            return Ok(Self::to_page(cached));
        }

        let query = ReadQuery {
            metric,
            bed,
            start,
            end,
            limit: self.page_size + 1,
            cursor,
        };
        let mut rows = self.repository.query_rows(&query).await?;

        let has_more = rows.len() > self.page_size;
        rows.truncate(self.page_size);

        let cached = CachedPage {
            total: rows.len(),
            has_more,
            rows,
        };
        self.cache.set(key, cached.clone());
        Ok(Self::to_page(cached))
    }

    /// Delete points in a window, then drop every cached page since any of
    /// them could now be stale.
    pub async fn delete_range(
        &self,
        metric: Option<MetricType>,
        bed: Option<Bed>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()> {
        self.repository.delete_range(metric, bed, start, end).await?;
        self.cache.clear();
        Ok(())
    }

    fn to_page(cached: CachedPage) -> VitalPage {
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        for row in &cached.rows {
            min_value = min_value.min(row.value);
            max_value = max_value.max(row.value);
        }
        if cached.rows.is_empty() {
            min_value = 0.0;
            max_value = 0.0;
        }
        let stats = PageStats {
            total: cached.total,
            min_value,
            max_value,
            unit: cached
                .rows
                .first()
                .map(|r| r.unit.clone())
                .unwrap_or_default(),
        };
        let next_cursor = if cached.has_more {
            cached.rows.last().map(|r| r.time)
        } else {
            None
        };
        VitalPage {
            rows: cached.rows,
            stats,
            has_more: cached.has_more,
            next_cursor,
        }
    }
}
