//! Integration coverage for the telemetry aggregator's collection
//! phases and retention eviction (invariant 3, §8).

use async_trait::async_trait;
use hydraroute::cluster::resources::{PodInfo, Selector, ServiceRef};
use hydraroute::cluster::{ClusterClient, InMemoryClusterClient};
use hydraroute::config::MetricsConfig;
use hydraroute::error::Result;
use hydraroute::telemetry::{MetricsSource, TelemetryAggregator};
use hydraroute::types::{ProxyStats, Target};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct StubSource {
    stats: ProxyStats,
}

#[async_trait]
impl MetricsSource for StubSource {
    async fn fetch(&self, _url: &str) -> Result<ProxyStats> {
        Ok(self.stats.clone())
    }
}

#[tokio::test]
async fn ingress_frontend_phase_feeds_request_metrics_into_the_snapshot() {
    let cluster = InMemoryClusterClient::new();
    cluster.insert_service(ServiceRef {
        namespace: "ns".into(),
        name: "svc".into(),
        selector: Selector::default(),
    });

    let mut config = MetricsConfig::default();
    config.nginx_metrics_url = "http://example.invalid/stats".into();

    let source = Arc::new(StubSource {
        stats: ProxyStats {
            requests_per_second: 250.0,
            response_time: 12.0,
            error_rate: 1.5,
            active_connections: 10,
            bytes_per_second: 2.0 * 1024.0 * 1024.0,
            upstream_metrics: HashMap::new(),
        },
    });

    let aggregator = TelemetryAggregator::new(
        config,
        Vec::new(),
        cluster.clone() as Arc<dyn ClusterClient>,
        source,
    );

    let services = cluster.list_services(None).await.unwrap();
    aggregator.collect_once(&services).await;

    let snapshot = aggregator.latest(&Target::new("ns", "svc")).await.unwrap();
    assert_eq!(snapshot.requests_per_second, 250.0);
    assert_eq!(snapshot.error_rate_pct, 1.5);
    assert!((snapshot.network_bandwidth_mbps - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn resource_phase_computes_utilization_from_pod_sums() {
    let cluster = InMemoryClusterClient::new();
    cluster.insert_service(ServiceRef {
        namespace: "ns".into(),
        name: "svc".into(),
        selector: Selector::default(),
    });
    cluster.insert_pods(
        "ns",
        "svc",
        vec![
            PodInfo {
                name: "p1".into(),
                namespace: "ns".into(),
                labels: HashMap::new(),
                cpu_usage_cores: 1.0,
                memory_usage_mib: 256.0,
                cpu_request_cores: 2.0,
                memory_request_mib: 512.0,
            },
            PodInfo {
                name: "p2".into(),
                namespace: "ns".into(),
                labels: HashMap::new(),
                cpu_usage_cores: 1.0,
                memory_usage_mib: 256.0,
                cpu_request_cores: 2.0,
                memory_request_mib: 512.0,
            },
        ],
    );

    let aggregator = TelemetryAggregator::new(
        MetricsConfig::default(),
        Vec::new(),
        cluster.clone() as Arc<dyn ClusterClient>,
        Arc::new(StubSource {
            stats: ProxyStats {
                requests_per_second: 0.0,
                response_time: 0.0,
                error_rate: 0.0,
                active_connections: 0,
                bytes_per_second: 0.0,
                upstream_metrics: HashMap::new(),
            },
        }),
    );

    let services = cluster.list_services(None).await.unwrap();
    aggregator.collect_once(&services).await;

    let snapshot = aggregator.latest(&Target::new("ns", "svc")).await.unwrap();
    // usage 2.0 cores / request 4.0 cores = 50%.
    assert_eq!(snapshot.cpu_utilization_pct, 50.0);
    assert_eq!(snapshot.memory_utilization_pct, 50.0);
}

#[tokio::test]
async fn retention_eviction_drops_history_older_than_the_window() {
    let cluster = InMemoryClusterClient::new();
    cluster.insert_service(ServiceRef {
        namespace: "ns".into(),
        name: "svc".into(),
        selector: Selector::default(),
    });

    let mut config = MetricsConfig::default();
    config.retention_period = Duration::from_secs(1);

    let aggregator = TelemetryAggregator::new(
        config,
        Vec::new(),
        cluster.clone() as Arc<dyn ClusterClient>,
        Arc::new(StubSource {
            stats: ProxyStats {
                requests_per_second: 0.0,
                response_time: 0.0,
                error_rate: 0.0,
                active_connections: 0,
                bytes_per_second: 0.0,
                upstream_metrics: HashMap::new(),
            },
        }),
    );

    let services = cluster.list_services(None).await.unwrap();
    aggregator.collect_once(&services).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    aggregator.collect_once(&[]).await; // triggers eviction with no new services

    let history = aggregator.history(&Target::new("ns", "svc")).await;
    assert!(history.is_empty());
}
