//! The telemetry aggregator (C1): periodic collection, bounded
//! per-target history, and cheap latest-snapshot reads (§4.1).

use crate::cluster::ClusterClient;
use crate::config::MetricsConfig;
use crate::telemetry::history::HistoryStore;
use crate::telemetry::phases::{
    ingress_frontend_phase, resource_phase, system_bandwidth_phase, workload_phase,
};
use crate::telemetry::source::MetricsSource;
use crate::types::{MetricsSnapshot, Target};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Notify;
use tracing::{debug, error, info};

/// Periodically gathers metrics per target and serves latest/history
/// reads. Owns no cluster-mutating state; it is purely observational.
pub struct TelemetryAggregator {
    config: MetricsConfig,
    watched_namespaces: Vec<String>,
    cluster: Arc<dyn ClusterClient>,
    source: Arc<dyn MetricsSource>,
    history: Arc<HistoryStore>,
    shutdown: Arc<Notify>,
    running: AtomicBool,
}

impl TelemetryAggregator {
    pub fn new(
        config: MetricsConfig,
        watched_namespaces: Vec<String>,
        cluster: Arc<dyn ClusterClient>,
        source: Arc<dyn MetricsSource>,
    ) -> Self {
        Self {
            config,
            watched_namespaces,
            cluster,
            source,
            history: Arc::new(HistoryStore::new()),
            shutdown: Arc::new(Notify::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn history_store(&self) -> Arc<HistoryStore> {
        Arc::clone(&self.history)
    }

    /// Cheap read of the most recent snapshot for a target.
    pub async fn latest(&self, target: &Target) -> Option<Arc<MetricsSnapshot>> {
        self.history.latest(target).await
    }

    /// Ordered snapshots within retention for a target.
    pub async fn history(&self, target: &Target) -> Vec<Arc<MetricsSnapshot>> {
        self.history.history(target).await
    }

    /// Run one collection cycle against the given (already enumerated)
    /// set of target services. Exposed separately from `start` so tests
    /// can drive single cycles deterministically.
    pub async fn collect_once(&self, services: &[crate::cluster::resources::ServiceRef]) {
        for service in services {
            let target = Target::new(&service.namespace, &service.name);
            let mut snapshot = MetricsSnapshot::empty(target.clone(), SystemTime::now());

            resource_phase(self.cluster.as_ref(), service, &mut snapshot).await;
            ingress_frontend_phase(self.source.as_ref(), &self.config, &mut snapshot).await;
            system_bandwidth_phase(&self.config, 0.0, 0.0, &mut snapshot);
            workload_phase(self.cluster.as_ref(), service, &mut snapshot).await;

            debug!(%target, "collected snapshot");
            self.history.append(snapshot).await;
        }

        self.history
            .evict_older_than(SystemTime::now(), self.config.retention_period)
            .await;
    }

    async fn run_collection_cycle(&self) {
        // Empty watched_namespaces means all namespaces (§4.1 step 1).
        let services = if self.watched_namespaces.is_empty() {
            self.cluster.list_services(None).await
        } else {
            let mut all = Vec::new();
            for ns in &self.watched_namespaces {
                match self.cluster.list_services(Some(ns.as_str())).await {
                    Ok(services) => all.extend(services),
                    Err(e) => {
                        error!(namespace = %ns, error = %e, "collection cycle failed to enumerate services");
                    }
                }
            }
            Ok(all)
        };
        let services = match services {
            Ok(services) => services,
            Err(e) => {
                error!(error = %e, "collection cycle failed to enumerate services");
                return;
            }
        };
        self.collect_once(&services).await;
    }

    /// Begin periodic collection; returns once `stop()` has been called.
    pub async fn start(self: &Arc<Self>) {
        self.running.store(true, Ordering::SeqCst);
        let mut interval = tokio::time::interval(self.config.collection_interval);
        info!(interval_secs = self.config.collection_interval.as_secs(), "telemetry aggregator starting");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_collection_cycle().await;
                }
                _ = self.shutdown.notified() => {
                    info!("telemetry aggregator stopping");
                    break;
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Idempotent: stopping an already-stopped aggregator is a no-op.
    pub fn stop(&self) {
        self.shutdown.notify_waiters();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::resources::{PodInfo, Selector};
    use crate::cluster::InMemoryClusterClient;
    use crate::telemetry::source::MetricsSource;
    use crate::error::Result;
    use crate::types::ProxyStats;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct NullSource;

    #[async_trait]
    impl MetricsSource for NullSource {
        async fn fetch(&self, _url: &str) -> Result<ProxyStats> {
            Ok(ProxyStats {
                requests_per_second: 0.0,
                response_time: 0.0,
                error_rate: 0.0,
                active_connections: 0,
                bytes_per_second: 0.0,
                upstream_metrics: HashMap::new(),
            })
        }
    }

    fn aggregator() -> (Arc<InMemoryClusterClient>, TelemetryAggregator) {
        let cluster = InMemoryClusterClient::new();
        let aggregator = TelemetryAggregator::new(
            MetricsConfig::default(),
            Vec::new(),
            cluster.clone() as Arc<dyn ClusterClient>,
            Arc::new(NullSource),
        );
        (cluster, aggregator)
    }

    #[tokio::test]
    async fn collect_once_populates_history_for_each_service() {
        let (cluster, aggregator) = aggregator();
        cluster.insert_service(crate::cluster::resources::ServiceRef {
            namespace: "ns".into(),
            name: "svc".into(),
            selector: Selector(HashMap::from([("app".into(), "web".into())])),
        });
        cluster.insert_pods(
            "ns",
            "svc",
            vec![PodInfo {
                name: "p".into(),
                namespace: "ns".into(),
                labels: HashMap::new(),
                cpu_usage_cores: 1.0,
                memory_usage_mib: 100.0,
                cpu_request_cores: 2.0,
                memory_request_mib: 200.0,
            }],
        );

        let services = cluster.list_services(None).await.unwrap();
        aggregator.collect_once(&services).await;

        let target = Target::new("ns", "svc");
        let latest = aggregator.latest(&target).await.unwrap();
        assert_eq!(latest.cpu_utilization_pct, 50.0);
    }

    #[tokio::test]
    async fn collection_failure_in_one_service_does_not_block_others() {
        let (cluster, aggregator) = aggregator();
        cluster.insert_service(crate::cluster::resources::ServiceRef {
            namespace: "ns".into(),
            name: "broken".into(),
            selector: Selector::default(),
        });
        cluster.insert_service(crate::cluster::resources::ServiceRef {
            namespace: "ns".into(),
            name: "healthy".into(),
            selector: Selector::default(),
        });
        let services = cluster.list_services(None).await.unwrap();
        aggregator.collect_once(&services).await;

        assert!(aggregator.latest(&Target::new("ns", "broken")).await.is_some());
        assert!(aggregator.latest(&Target::new("ns", "healthy")).await.is_some());
    }

    #[tokio::test]
    async fn stop_is_idempotent_with_no_active_listeners() {
        let (_cluster, aggregator) = aggregator();
        aggregator.stop();
        aggregator.stop();
    }
}
