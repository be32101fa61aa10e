// Planning of point counts, tasks and batches for a generation run
use crate::domain::generation::GenerationConfig;
use chrono::{DateTime, Duration, Utc};

/// Ceiling on points generated per task; very large runs are split into
/// sequential tasks of at most this many points to bound peak memory.
pub const MAX_POINTS_PER_TASK: u64 = 1_000_000;

/// One sequential sub-span of a run's time axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpan {
    /// 1-based task number.
    pub index: u32,
    pub start: DateTime<Utc>,
    /// Number of interval ticks in this task, per (metric, bed) pair.
    pub ticks: u64,
}

impl TaskSpan {
    pub fn points(&self, config: &GenerationConfig) -> u64 {
        self.ticks * config.pair_count()
    }
}

/// Number of interval ticks from start to end inclusive.
/// A zero-length span still yields the single starting tick.
pub fn ticks_in_span(start: DateTime<Utc>, end: DateTime<Utc>, interval: Duration) -> u64 {
    if start >= end {
        return 1;
    }
    let span_ms = (end - start).num_milliseconds() as f64;
    let step_ms = interval.num_milliseconds() as f64;
    (span_ms / step_ms).ceil() as u64 + 1
}

/// Total points for a run: every (metric, bed) pair gets its own series
/// over the same time span.
pub fn count_total_points(config: &GenerationConfig) -> u64 {
    ticks_in_span(config.start, config.end, config.interval()) * config.pair_count()
}

/// Partition the tick axis into sequential tasks, each generating at most
/// `max_points_per_task` points across all pairs.
pub fn plan_tasks(config: &GenerationConfig, max_points_per_task: u64) -> Vec<TaskSpan> {
    let total_ticks = ticks_in_span(config.start, config.end, config.interval());
    let ticks_per_task = (max_points_per_task / config.pair_count()).max(1);
    let step_ms = config.interval_ms();

    let mut tasks = Vec::new();
    let mut offset: u64 = 0;
    let mut index: u32 = 1;
    while offset < total_ticks {
        let ticks = ticks_per_task.min(total_ticks - offset);
        let start = config.start + Duration::milliseconds(step_ms * offset as i64);
        tasks.push(TaskSpan { index, start, ticks });
        offset += ticks;
        index += 1;
    }
    tasks
}

/// Batch lengths for the whole run, in emission order. Batches never span a
/// task boundary; lengths sum to `count_total_points`.
pub fn plan_batches(
    config: &GenerationConfig,
    batch_size: usize,
    max_points_per_task: u64,
) -> Vec<usize> {
    let batch_size = batch_size.max(1) as u64;
    let mut batches = Vec::new();
    for task in plan_tasks(config, max_points_per_task) {
        let mut remaining = task.points(config);
        while remaining > 0 {
            let len = remaining.min(batch_size);
            batches.push(len as usize);
            remaining -= len;
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vitals::{Bed, MetricType};
    use chrono::TimeZone;

    fn config(minutes: i64, interval: f64) -> GenerationConfig {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        GenerationConfig {
            start,
            end: start + Duration::minutes(minutes),
            metrics: vec![MetricType::HeartRate],
            beds: vec![Bed(1)],
            interval_minutes: interval,
        }
    }

    #[test]
    fn test_inclusive_tick_count() {
        // T, T+10, ..., T+50
        assert_eq!(count_total_points(&config(50, 10.0)), 6);
    }

    #[test]
    fn test_zero_length_span_plans_one_point() {
        assert_eq!(count_total_points(&config(0, 5.0)), 1);
        let tasks = plan_tasks(&config(0, 5.0), MAX_POINTS_PER_TASK);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].ticks, 1);
    }

    #[test]
    fn test_unaligned_span_rounds_up() {
        // 55 minutes at 10-minute spacing: ceil(5.5) + 1
        assert_eq!(count_total_points(&config(55, 10.0)), 7);
    }

    #[test]
    fn test_pairs_multiply_totals() {
        let mut cfg = config(50, 10.0);
        cfg.metrics = vec![MetricType::HeartRate, MetricType::BloodOxygen];
        cfg.beds = vec![Bed(1), Bed(2), Bed(3)];
        assert_eq!(count_total_points(&cfg), 6 * 6);
    }

    #[test]
    fn test_task_split_covers_all_ticks() {
        let cfg = config(990, 1.0); // 991 ticks
        let tasks = plan_tasks(&cfg, 100);
        assert_eq!(tasks.len(), 10);
        assert_eq!(tasks.iter().map(|t| t.ticks).sum::<u64>(), 991);
        assert!(tasks.iter().take(9).all(|t| t.ticks == 100));
        assert_eq!(tasks.last().unwrap().ticks, 91);

        // Task starts are consecutive on the tick axis
        for pair in tasks.windows(2) {
            let expected = pair[0].start + Duration::minutes(pair[0].ticks as i64);
            assert_eq!(pair[1].start, expected);
        }
    }

    #[test]
    fn test_task_split_accounts_for_pairs() {
        let mut cfg = config(99, 1.0); // 100 ticks
        cfg.beds = vec![Bed(1), Bed(2)]; // 200 points
        let tasks = plan_tasks(&cfg, 60);
        // 30 ticks per task at 2 points per tick
        assert!(tasks.iter().all(|t| t.points(&cfg) <= 60));
        assert_eq!(tasks.iter().map(|t| t.points(&cfg)).sum::<u64>(), 200);
    }

    #[test]
    fn test_batches_sum_to_total() {
        let cfg = config(990, 1.0);
        let batches = plan_batches(&cfg, 250, 400);
        assert_eq!(
            batches.iter().map(|&b| b as u64).sum::<u64>(),
            count_total_points(&cfg)
        );
        assert!(batches.iter().all(|&b| b <= 250));
    }
}
