// Background generation worker
//
// Generation is CPU bound so it runs on a dedicated thread and publishes
// typed messages into a bounded tokio channel with blocking_send; the
// async side stays responsive and applies backpressure through the
// channel capacity.
use crate::application::batch_planner::{
    count_total_points, plan_batches, plan_tasks, MAX_POINTS_PER_TASK,
};
use crate::application::sample_generator::SampleGenerator;
use crate::domain::generation::GenerationConfig;
use crate::domain::vitals::VitalSample;
use crate::error::VitalError;
use chrono::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Messages published by the worker, in order: one Init, then per batch a
/// Batch followed by Progress and TaskProgress, a TaskComplete per task,
/// and finally exactly one of Complete or Failed.
#[derive(Debug)]
pub enum WorkerMessage {
    Init {
        total_points: u64,
        total_tasks: u32,
        total_batches: u64,
    },
    Batch(Vec<VitalSample>),
    Progress {
        generated: u64,
        total: u64,
        percent: f64,
    },
    TaskProgress {
        task: u32,
        total_tasks: u32,
        percent: f64,
    },
    TaskComplete {
        task: u32,
    },
    Complete {
        generated: u64,
        total: u64,
    },
    Failed(VitalError),
}

#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub batch_size: usize,
    pub max_points_per_task: u64,
    pub channel_capacity: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_points_per_task: MAX_POINTS_PER_TASK,
            channel_capacity: 100,
        }
    }
}

/// Cooperative cancellation flag, polled at every batch boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Start generating `config` off-thread. The caller must have validated the
/// config. Dropping the receiver stops the worker at the next batch boundary.
pub fn spawn_generation(
    config: GenerationConfig,
    options: WorkerOptions,
    cancel: CancelFlag,
) -> mpsc::Receiver<WorkerMessage> {
    let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));

    thread::spawn(move || {
        let mut ctx = WorkerCtx {
            tx,
            cancel,
            total: count_total_points(&config),
            emitted_before: 0,
        };
        match run(&config, &options, &mut ctx) {
            Ok(()) | Err(Stop::Disconnected) => {}
            Err(Stop::Failed(err)) => {
                let _ = ctx.tx.blocking_send(WorkerMessage::Failed(err));
            }
        }
    });

    rx
}

/// Why the generation loop stopped early.
enum Stop {
    /// Receiver dropped; nobody is listening anymore.
    Disconnected,
    Failed(VitalError),
}

struct WorkerCtx {
    tx: mpsc::Sender<WorkerMessage>,
    cancel: CancelFlag,
    total: u64,
    /// Points emitted in fully completed tasks.
    emitted_before: u64,
}

impl WorkerCtx {
    fn send(&self, message: WorkerMessage) -> Result<(), Stop> {
        self.tx
            .blocking_send(message)
            .map_err(|_| Stop::Disconnected)
    }

    fn flush(
        &mut self,
        batch: &mut Vec<VitalSample>,
        emitted_in_task: &mut u64,
        task_index: u32,
        total_tasks: u32,
        task_points: u64,
    ) -> Result<(), Stop> {
        if self.cancel.is_cancelled() {
            return Err(Stop::Failed(VitalError::Cancelled));
        }

        let len = batch.len() as u64;
        self.send(WorkerMessage::Batch(std::mem::take(batch)))?;
        *emitted_in_task += len;

        let generated = self.emitted_before + *emitted_in_task;
        self.send(WorkerMessage::Progress {
            generated,
            total: self.total,
            percent: generated as f64 / self.total as f64 * 100.0,
        })?;
        self.send(WorkerMessage::TaskProgress {
            task: task_index,
            total_tasks,
            percent: *emitted_in_task as f64 / task_points as f64 * 100.0,
        })?;
        Ok(())
    }
}

fn run(config: &GenerationConfig, options: &WorkerOptions, ctx: &mut WorkerCtx) -> Result<(), Stop> {
    let batch_size = options.batch_size.max(1);
    let tasks = plan_tasks(config, options.max_points_per_task);
    let total_tasks = tasks.len() as u32;
    let total_batches =
        plan_batches(config, batch_size, options.max_points_per_task).len() as u64;

    ctx.send(WorkerMessage::Init {
        total_points: ctx.total,
        total_tasks,
        total_batches,
    })?;

    let pairs = config.pairs();
    let step_ms = config.interval_ms();
    let mut generator = SampleGenerator::new(rand::thread_rng());

    for task in &tasks {
        let task_points = task.points(config);
        let mut emitted_in_task: u64 = 0;
        let mut batch = Vec::with_capacity(batch_size);

        for &(metric, bed) in &pairs {
            for tick in 0..task.ticks {
                let time = task.start + Duration::milliseconds(step_ms * tick as i64);
                batch.push(generator.generate(metric, bed, time));

                if batch.len() >= batch_size {
                    ctx.flush(
                        &mut batch,
                        &mut emitted_in_task,
                        task.index,
                        total_tasks,
                        task_points,
                    )?;
                }
            }
        }

        if !batch.is_empty() {
            ctx.flush(
                &mut batch,
                &mut emitted_in_task,
                task.index,
                total_tasks,
                task_points,
            )?;
        }

        ctx.emitted_before += emitted_in_task;
        ctx.send(WorkerMessage::TaskComplete { task: task.index })?;
    }

    ctx.send(WorkerMessage::Complete {
        generated: ctx.emitted_before,
        total: ctx.total,
    })?;
    Ok(())
}
