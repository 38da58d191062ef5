use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod pipeline;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod tooling;

#[cfg(test)]
mod testing;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::pipeline::artifacts::ArtifactLayout;
use crate::repository::JobStore;
use crate::scheduler::{DetachedRuns, QueueWorker, WorkQueue, recovery};
use crate::state::AppState;
use crate::tooling::CommandTooling;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribe_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Scribe server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Configuration: public_dir={}, jobs_dir={}, tmp_dir={}, queue_capacity={}, overflow={}",
        config.public_dir.display(),
        config.jobs_dir.display(),
        config.tmp_dir.display(),
        config.queue_capacity,
        config.overflow_policy
    );

    for dir in [&config.public_dir, &config.jobs_dir, &config.tmp_dir] {
        prepare_dir(dir);
    }

    tooling::command::check_tools_available(&config.tools).await;

    let store = Arc::new(JobStore::new(&config.jobs_dir));
    let tooling = Arc::new(CommandTooling::new(config.tools.clone(), &config.tmp_dir));
    let layout = ArtifactLayout::new(&config.public_dir, &config.tmp_dir);
    let pipeline = Pipeline::new(store.clone(), tooling, layout, config.chunking);

    let detached = DetachedRuns::new(config.max_detached_runs);
    recovery::recover(&store, &pipeline, &detached);

    let (queue, receiver) = WorkQueue::new(
        config.queue_capacity,
        config.overflow_policy,
        detached,
        pipeline.clone(),
    );
    QueueWorker::new(receiver, pipeline).spawn();

    let state = AppState::new(store, queue, config.allowlist.clone());
    let app = api::create_router(state, &config.public_dir);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Creates a working directory, logging instead of failing
fn prepare_dir(dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!("Failed to create directory {}: {}", dir.display(), e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
