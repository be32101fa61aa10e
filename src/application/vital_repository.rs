// Repository trait for the time-series sink
use crate::domain::vitals::{Bed, MetricType, VitalSample};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One stored reading as returned by the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct VitalRow {
    pub time: DateTime<Utc>,
    pub value: f64,
    pub metric: String,
    pub bed: String,
    pub unit: String,
}

/// Parameters for one paginated read against the sink.
#[derive(Debug, Clone)]
pub struct ReadQuery {
    pub metric: MetricType,
    pub bed: Bed,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Maximum number of rows to return; callers ask for one extra row to
    /// detect whether more pages exist.
    pub limit: usize,
    /// Timestamp of the last row of the previous page, if any.
    pub cursor: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait VitalRepository: Send + Sync {
    /// Persist one ordered list of samples in a single sink call.
    /// Succeeds or fails as a whole.
    async fn write_points(&self, samples: &[VitalSample]) -> Result<()>;

    /// Query stored rows sorted by time ascending.
    async fn query_rows(&self, query: &ReadQuery) -> Result<Vec<VitalRow>>;

    /// Delete points matching the optional tag filters within a time window.
    async fn delete_range(
        &self,
        metric: Option<MetricType>,
        bed: Option<Bed>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()>;
}
