//! Worker binary: connects the shared stores and runs the configured
//! number of worker tasks.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_api::ChatClient;
use database::Database;
use detector_client::DetectorClient;
use job_queue::{JobQueue, QueueConfig};
use notifier::NominatimGeocoder;
use object_store::HttpStore;
use worker::{Pipeline, Runner, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WorkerConfig::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let chat = ChatClient::from_env()?;
    let detector = DetectorClient::from_env()?;
    let store = Arc::new(HttpStore::from_env()?);
    let geocoder = Arc::new(NominatimGeocoder::new()?);

    let job_timeout = Duration::from_secs(config.job_timeout_secs);
    let queue = JobQueue::new(
        db.pool().clone(),
        QueueConfig {
            job_timeout,
            ..QueueConfig::default()
        },
    );

    let pipeline = Arc::new(Pipeline::new(
        db.pool().clone(),
        store,
        Arc::new(detector),
        Arc::new(chat),
        geocoder,
        config.daily_free_quota,
    ));

    info!("starting {} worker tasks", config.worker_count);
    let mut handles = Vec::new();
    for _ in 0..config.worker_count {
        let runner = Runner::new(
            queue.clone(),
            pipeline.clone(),
            job_timeout,
            Duration::from_secs(config.idle_poll_secs),
        );
        handles.push(tokio::spawn(runner.run()));
    }
    for handle in handles {
        handle.await??;
    }
    Ok(())
}
