//! Gateway binary: wires the chat client, database, queue, and blob store
//! together and runs the ingress loop.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_api::ChatClient;
use database::Database;
use gateway::{Gateway, GatewayConfig};
use job_queue::{JobQueue, QueueConfig};
use object_store::HttpStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let chat = ChatClient::from_env()?;
    let detector = detector_client::DetectorClient::from_env()?;
    let store = Arc::new(HttpStore::from_env()?);

    let queue = JobQueue::new(
        db.pool().clone(),
        QueueConfig {
            depth_limit: config.queue_depth_limit,
            ..QueueConfig::default()
        },
    );

    info!("gateway configured; entering event loop");
    Gateway::new(chat, db, queue, store, detector, config)
        .run()
        .await?;
    Ok(())
}
