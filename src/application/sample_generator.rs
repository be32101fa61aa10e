// Synthetic sample generation
use crate::domain::vitals::{Bed, MetricType, VitalSample};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces synthetic readings within each metric's plausible range.
/// The random source is injected so tests can seed it.
pub struct SampleGenerator<R: Rng> {
    rng: R,
}

impl SampleGenerator<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SampleGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self, metric: MetricType, bed: Bed, time: DateTime<Utc>) -> VitalSample {
        let (min, max) = metric.value_range();
        let value = if metric.is_discrete() {
            self.rng.gen_range(min as i64..=max as i64) as f64
        } else {
            round2(self.rng.gen_range(min..=max))
        };
        VitalSample::new(metric, bed, time, value)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
