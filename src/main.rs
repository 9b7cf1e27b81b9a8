//! Bridge process entry point: load config, init logging, wire the pipeline,
//! serve the webhook ingress.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bridge::cli::Args;
use bridge::domain::ports::AgentPool;
use bridge::infrastructure::config::ConfigLoader;
use bridge::infrastructure::http::ingress;
use bridge::infrastructure::logging;
use bridge::infrastructure::ConcurrentAgentPool;
use bridge::services::{event_worker_pool, EventQueue, Reconciler, RegistryClient};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::load_from_file(&args.config).context("failed to load configuration")?;
    if let Some(bind_address) = args.bind_address {
        config.bind_address = bind_address;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    logging::init(&config).context("failed to initialize logging")?;
    info!(config_path = %args.config, "configuration loaded");

    let agent_pool: Arc<dyn AgentPool> = Arc::new(ConcurrentAgentPool::new(&config));
    let registry = Arc::new(
        RegistryClient::new(agent_pool, config.clone()).context("failed to build registry client")?,
    );
    let reconciler = Arc::new(Reconciler::new(registry));

    let (queue, receiver) = EventQueue::new(config.queue_capacity);
    let workers = event_worker_pool::spawn_workers(receiver, config.workers, reconciler);

    let router = ingress::router(queue, config.enqueue_timeout_ms);
    let bind_address = config.bind_address.clone();

    let serve_result = ingress::serve(router, &bind_address).await;

    for worker in workers {
        worker.abort();
    }

    serve_result
}
