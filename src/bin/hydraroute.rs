//! Process entry point: load configuration, wire the three components
//! together, and run until a shutdown signal arrives.
//!
//! The cluster API client, authentication, and the HTTP health-probe
//! endpoint are external collaborators (§1 Non-goals of the core); this
//! binary wires in the in-memory client as a placeholder for whichever
//! production client a deployment brings.

use hydraroute::cluster::{ClusterClient, InMemoryClusterClient};
use hydraroute::config::Config;
use hydraroute::controller::{LogAuditSink, ReconciliationController};
use hydraroute::decision::DecisionEngine;
use hydraroute::telemetry::{ReqwestMetricsSource, TelemetryAggregator};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = env::var("HYDRAROUTE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("hydraroute.toml"));

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, path = %config_path.display(), "configuration error, using defaults");
            Config::default()
        }
    };

    info!("hydraroute starting");

    let cluster: Arc<dyn ClusterClient> = InMemoryClusterClient::new();
    let source = Arc::new(ReqwestMetricsSource::new()?);

    let aggregator = Arc::new(TelemetryAggregator::new(
        config.metrics.clone(),
        config.general.watched_namespaces.clone(),
        Arc::clone(&cluster),
        source,
    ));

    let engine = Arc::new(DecisionEngine::new(
        &config.scaling,
        config.metrics.request_rate_window,
    ));

    let controller = Arc::new(ReconciliationController::new(
        Arc::clone(&cluster),
        Arc::clone(&aggregator),
        Arc::clone(&engine),
        Arc::new(LogAuditSink),
        config.general.watched_namespaces.clone(),
        config.default_bounds(),
        config.general.dry_run,
        config.general.requeue_interval,
        config.metrics.request_rate_window,
    ));

    let aggregator_task = {
        let aggregator = Arc::clone(&aggregator);
        tokio::spawn(async move { aggregator.start().await })
    };
    let controller_task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.start().await })
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    aggregator.stop();
    controller.stop();

    let _ = tokio::join!(aggregator_task, controller_task);
    info!("hydraroute stopped");
    Ok(())
}
