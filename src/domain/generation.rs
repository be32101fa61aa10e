// Generation run parameters
use crate::domain::vitals::{Bed, MetricType};
use crate::error::{Result, VitalError};
use chrono::{DateTime, Duration, Utc};

/// Parameters for one generation run, validated once and then immutable.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub metrics: Vec<MetricType>,
    pub beds: Vec<Bed>,
    /// Spacing between samples; fractional minutes allow sub-minute intervals.
    pub interval_minutes: f64,
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(VitalError::Validation(
                "at least one metric type is required".into(),
            ));
        }
        if self.beds.is_empty() {
            return Err(VitalError::Validation("at least one bed is required".into()));
        }
        if self.start > self.end {
            return Err(VitalError::Validation(
                "start time must not be after end time".into(),
            ));
        }
        if !(self.interval_minutes > 0.0) {
            return Err(VitalError::Validation(
                "interval must be strictly positive".into(),
            ));
        }
        if self.interval_ms() < 1 {
            return Err(VitalError::Validation(
                "interval must round to at least one millisecond".into(),
            ));
        }
        Ok(())
    }

    pub fn interval_ms(&self) -> i64 {
        (self.interval_minutes * 60_000.0).round() as i64
    }

    pub fn interval(&self) -> Duration {
        Duration::milliseconds(self.interval_ms())
    }

    /// Number of independent (metric, bed) series in this run.
    pub fn pair_count(&self) -> u64 {
        self.metrics.len() as u64 * self.beds.len() as u64
    }

    /// All (metric, bed) combinations in a fixed iteration order.
    pub fn pairs(&self) -> Vec<(MetricType, Bed)> {
        let mut pairs = Vec::with_capacity(self.metrics.len() * self.beds.len());
        for &metric in &self.metrics {
            for &bed in &self.beds {
                pairs.push((metric, bed));
            }
        }
        pairs
    }
}
