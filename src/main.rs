// Main entry point - Dependency injection and pipeline run
use std::sync::Arc;

use vitals_telemetry::application::generation_service::GenerationService;
use vitals_telemetry::application::generation_worker::{CancelFlag, WorkerOptions};
use vitals_telemetry::infrastructure::cache::QueryCache;
use vitals_telemetry::infrastructure::config::{load_generation_config, load_influx_config};
use vitals_telemetry::infrastructure::influx_repository::InfluxRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let influx_config = load_influx_config()?;
    let generation_settings = load_generation_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(InfluxRepository::new(influx_config.influx)?);
    let cache = Arc::new(QueryCache::new());

    // Create service (application layer)
    let mut options = WorkerOptions::default();
    if let Some(batch_size) = generation_settings.batch_size {
        options.batch_size = batch_size;
    }
    let service = GenerationService::new(repository, cache).with_options(options);

    // Ctrl-C requests cooperative cancellation; the worker stops at the next
    // batch boundary and already-written chunks are kept.
    let cancel = CancelFlag::new();
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("cancellation requested, stopping at next batch");
            ctrl_c_flag.cancel();
        }
    });

    let summary = service.run(generation_settings.to_config(), cancel).await?;
    tracing::info!(
        planned = summary.planned,
        generated = summary.generated,
        written = summary.written,
        "generation run finished"
    );

    Ok(())
}
