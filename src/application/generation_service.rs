// Generation pipeline orchestration
use crate::application::generation_worker::{
    spawn_generation, CancelFlag, WorkerMessage, WorkerOptions,
};
use crate::application::sink_writer::SinkWriter;
use crate::application::vital_repository::VitalRepository;
use crate::domain::generation::GenerationConfig;
use crate::error::Result;
use crate::infrastructure::cache::QueryCache;
use futures::StreamExt;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

/// Outcome of a completed run; generated always equals planned on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub planned: u64,
    pub generated: u64,
    pub written: u64,
}

/// Runs one validated config end to end: spawns the background worker,
/// streams every batch into the sink writer, and invalidates the read cache
/// as newly written points land.
pub struct GenerationService {
    writer: SinkWriter,
    cache: Arc<QueryCache>,
    options: WorkerOptions,
}

impl GenerationService {
    pub fn new(repository: Arc<dyn VitalRepository>, cache: Arc<QueryCache>) -> Self {
        Self {
            writer: SinkWriter::new(repository),
            cache,
            options: WorkerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WorkerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_writer(mut self, writer: SinkWriter) -> Self {
        self.writer = writer;
        self
    }

    pub async fn run(&self, config: GenerationConfig, cancel: CancelFlag) -> Result<RunSummary> {
        config.validate()?;

        let rx = spawn_generation(config, self.options.clone(), cancel);
        let mut messages = ReceiverStream::new(rx);

        let mut planned: u64 = 0;
        let mut generated: u64 = 0;
        let mut written: u64 = 0;

        while let Some(message) = messages.next().await {
            match message {
                WorkerMessage::Init {
                    total_points,
                    total_tasks,
                    total_batches,
                } => {
                    planned = total_points;
                    tracing::info!(total_points, total_tasks, total_batches, "generation started");
                }
                WorkerMessage::Batch(samples) => {
                    let count = samples.len() as u64;
                    if let Err(err) = self
                        .writer
                        .write(&samples, |pct| {
                            tracing::debug!(percent = pct, "batch write progress")
                        })
                        .await
                    {
                        tracing::warn!(written, planned, error = %err, "run aborted mid-write");
                        self.cache.clear();
                        return Err(err);
                    }
                    written += count;
                }
                WorkerMessage::Progress {
                    generated: count,
                    total,
                    percent,
                } => {
                    generated = count;
                    tracing::debug!(generated, total, percent, "generation progress");
                }
                WorkerMessage::TaskProgress {
                    task,
                    total_tasks,
                    percent,
                } => {
                    tracing::debug!(task, total_tasks, percent, "task progress");
                }
                WorkerMessage::TaskComplete { task } => {
                    // Written points may overlap cached windows; drop them now
                    // rather than serving stale aggregates mid-run.
                    self.cache.clear();
                    tracing::info!(task, "task complete");
                }
                WorkerMessage::Complete { generated: count, total } => {
                    generated = count;
                    tracing::info!(generated, total, "generation complete");
                }
                WorkerMessage::Failed(err) => {
                    tracing::warn!(written, planned, error = %err, "generation run failed");
                    self.cache.clear();
                    return Err(err);
                }
            }
        }

        self.cache.clear();
        Ok(RunSummary {
            planned,
            generated,
            written,
        })
    }
}
