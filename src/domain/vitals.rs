// Vital-sign domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of monitored vital signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricType {
    HeartRate,
    BloodOxygen,
    BloodPressure,
    Temperature,
    RespirationRate,
    BloodGlucose,
    HeartRateVariability,
    StressLevel,
}

impl MetricType {
    pub const ALL: [MetricType; 8] = [
        MetricType::HeartRate,
        MetricType::BloodOxygen,
        MetricType::BloodPressure,
        MetricType::Temperature,
        MetricType::RespirationRate,
        MetricType::BloodGlucose,
        MetricType::HeartRateVariability,
        MetricType::StressLevel,
    ];

    /// Tag value used by the sink and the display layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::HeartRate => "heartRate",
            MetricType::BloodOxygen => "bloodOxygen",
            MetricType::BloodPressure => "bloodPressure",
            MetricType::Temperature => "temperature",
            MetricType::RespirationRate => "respirationRate",
            MetricType::BloodGlucose => "bloodGlucose",
            MetricType::HeartRateVariability => "heartRateVariability",
            MetricType::StressLevel => "stressLevel",
        }
    }

    /// Display unit, fixed per metric.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricType::HeartRate => "BPM",
            MetricType::BloodOxygen => "%",
            MetricType::BloodPressure => "mmHg",
            MetricType::Temperature => "°C",
            MetricType::RespirationRate => "breaths/min",
            MetricType::BloodGlucose => "mmol/L",
            MetricType::HeartRateVariability => "ms",
            MetricType::StressLevel => "/5",
        }
    }

    /// Plausible value range for synthetic readings.
    pub fn value_range(&self) -> (f64, f64) {
        match self {
            MetricType::HeartRate => (60.0, 100.0),
            MetricType::BloodOxygen => (95.0, 100.0),
            MetricType::BloodPressure => (90.0, 140.0),
            MetricType::Temperature => (36.0, 37.5),
            MetricType::RespirationRate => (12.0, 20.0),
            MetricType::BloodGlucose => (4.0, 7.0),
            MetricType::HeartRateVariability => (20.0, 100.0),
            MetricType::StressLevel => (1.0, 5.0),
        }
    }

    /// Stress level is reported as a whole number of levels, not a float.
    pub fn is_discrete(&self) -> bool {
        matches!(self, MetricType::StressLevel)
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ward bed identifier; the ward has beds 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bed(pub u8);

impl Bed {
    pub const ALL: [Bed; 5] = [Bed(1), Bed(2), Bed(3), Bed(4), Bed(5)];

    pub fn label(&self) -> String {
        format!("bed-{}", self.0)
    }
}

impl fmt::Display for Bed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bed-{}", self.0)
    }
}

/// One synthetic reading. The unit is always derived from the metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSample {
    pub time: DateTime<Utc>,
    pub value: f64,
    pub metric: MetricType,
    pub unit: &'static str,
    pub bed: Bed,
}

impl VitalSample {
    pub fn new(metric: MetricType, bed: Bed, time: DateTime<Utc>, value: f64) -> Self {
        Self {
            time,
            value,
            metric,
            unit: metric.unit(),
            bed,
        }
    }
}
