// Chunked persistence of generated samples
use crate::application::vital_repository::VitalRepository;
use crate::domain::vitals::VitalSample;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

pub const WRITE_CHUNK_SIZE: usize = 1000;
/// Pause between chunk writes so bulk loads do not flood the sink.
pub const INTER_CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Writes samples to the sink in bounded, strictly sequential chunks.
pub struct SinkWriter {
    repository: Arc<dyn VitalRepository>,
    chunk_size: usize,
    delay: Duration,
}

impl SinkWriter {
    pub fn new(repository: Arc<dyn VitalRepository>) -> Self {
        Self {
            repository,
            chunk_size: WRITE_CHUNK_SIZE,
            delay: INTER_CHUNK_DELAY,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Persist all samples, calling `on_progress` with the cumulative percent
    /// after each chunk. A failed chunk propagates immediately; chunks already
    /// written stay persisted.
    pub async fn write<F>(&self, samples: &[VitalSample], mut on_progress: F) -> Result<()>
    where
        F: FnMut(f64),
    {
        let total = samples.len();
        if total == 0 {
            return Ok(());
        }

        let mut written = 0usize;
        for chunk in samples.chunks(self.chunk_size) {
            self.repository.write_points(chunk).await?;
            written += chunk.len();
            on_progress(written as f64 / total as f64 * 100.0);

            if written < total {
                tokio::time::sleep(self.delay).await;
            }
        }
        Ok(())
    }
}
