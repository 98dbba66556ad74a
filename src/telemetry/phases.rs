//! The four independently fault-tolerant phases that build one
//! snapshot per service per collection cycle (§4.1). Each phase takes a
//! snapshot-in-progress and either fills in its fields or, on failure,
//! logs and leaves them at their zero/sentinel values (a phase failure
//! never invalidates the snapshot as a whole).

use crate::cluster::{find_backing_workload, resources::ServiceRef, ClusterClient, WorkloadRef};
use crate::config::MetricsConfig;
use crate::telemetry::source::MetricsSource;
use crate::types::MetricsSnapshot;
use tracing::warn;

/// Sum container CPU (cores) and memory (MiB) usage and requests across
/// every pod backing the service; utilization = `100 * usage / request`
/// (0 if request is 0).
pub async fn resource_phase(
    cluster: &dyn ClusterClient,
    service: &ServiceRef,
    snapshot: &mut MetricsSnapshot,
) {
    let pods = match cluster.list_pods(&service.namespace, &service.name).await {
        Ok(pods) => pods,
        Err(e) => {
            warn!(target = %snapshot.target, error = %e, "resource phase failed");
            return;
        }
    };

    let (mut cpu_usage, mut cpu_request) = (0.0, 0.0);
    let (mut mem_usage, mut mem_request) = (0.0, 0.0);
    for pod in &pods {
        cpu_usage += pod.cpu_usage_cores;
        cpu_request += pod.cpu_request_cores;
        mem_usage += pod.memory_usage_mib;
        mem_request += pod.memory_request_mib;
    }

    snapshot.cpu_utilization_pct = if cpu_request > 0.0 {
        100.0 * cpu_usage / cpu_request
    } else {
        0.0
    };
    snapshot.memory_utilization_pct = if mem_request > 0.0 {
        100.0 * mem_usage / mem_request
    } else {
        0.0
    };
}

/// HTTP GET of the configured proxy-statistics URL. Endpoint unreachable
/// or malformed is a phase failure, not a collection-cycle failure.
pub async fn ingress_frontend_phase(
    source: &dyn MetricsSource,
    config: &MetricsConfig,
    snapshot: &mut MetricsSnapshot,
) {
    if config.nginx_metrics_url.is_empty() {
        return;
    }
    match source.fetch(&config.nginx_metrics_url).await {
        Ok(stats) => {
            snapshot.requests_per_second = stats.requests_per_second;
            snapshot.avg_response_time_ms = stats.response_time;
            snapshot.error_rate_pct = stats.error_rate;
            snapshot.network_bandwidth_mbps = stats.bytes_per_second / (1024.0 * 1024.0);
        }
        Err(e) => {
            warn!(target = %snapshot.target, error = %e, "ingress-frontend phase failed");
        }
    }
}

/// Only produces `network_bandwidth`/`io_bandwidth` when explicitly
/// enabled; if the ingress-frontend phase already set
/// `network_bandwidth`, that value wins.
pub fn system_bandwidth_phase(
    config: &MetricsConfig,
    network_bandwidth_sample: f64,
    io_bandwidth_sample: f64,
    snapshot: &mut MetricsSnapshot,
) {
    if !config.bandwidth_monitoring.enabled {
        return;
    }
    if snapshot.network_bandwidth_mbps == 0.0 {
        snapshot.network_bandwidth_mbps = network_bandwidth_sample;
    }
    snapshot.io_bandwidth_mbps = io_bandwidth_sample;
}

/// Resolves the workload backing the service and records its observed
/// current/desired replica counts.
pub async fn workload_phase(
    cluster: &dyn ClusterClient,
    service: &ServiceRef,
    snapshot: &mut MetricsSnapshot,
) {
    let workloads: Vec<WorkloadRef> = match cluster.list_workloads(&service.namespace).await {
        Ok(w) => w,
        Err(e) => {
            warn!(target = %snapshot.target, error = %e, "workload phase failed listing workloads");
            return;
        }
    };

    let Some(matched) = find_backing_workload(service, &workloads) else {
        return;
    };

    match cluster.get_workload(&matched.namespace, &matched.name).await {
        Ok(Some(workload)) => {
            snapshot.current_replicas = workload.current_replicas;
            snapshot.desired_replicas = workload.desired_replicas;
        }
        Ok(None) => {}
        Err(e) => {
            warn!(target = %snapshot.target, error = %e, "workload phase failed fetching workload");
        }
    }
}
