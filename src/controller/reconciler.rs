//! The reconciliation controller (C3): watches participating ingresses,
//! resolves each backend service to a workload, drives C2 with the
//! latest snapshot from C1, and commits replica changes with provenance
//! annotations (§4.3).

use crate::cluster::resources::{Ingress, ServiceRef};
use crate::cluster::{find_backing_workload, ClusterClient};
use crate::controller::audit::AuditSink;
use crate::controller::provenance;
use crate::controller::queue::ReconcileQueue;
use crate::decision::DecisionEngine;
use crate::error::Result;
use crate::telemetry::TelemetryAggregator;
use crate::types::{Bounds, Target, TrainingSample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Notify;
use tracing::{error, info, warn};

pub struct ReconciliationController {
    cluster: Arc<dyn ClusterClient>,
    aggregator: Arc<TelemetryAggregator>,
    engine: Arc<DecisionEngine>,
    audit: Arc<dyn AuditSink>,
    queue: ReconcileQueue,
    watched_namespaces: Vec<String>,
    default_bounds: Bounds,
    dry_run: bool,
    requeue_interval: Duration,
    request_rate_window: Duration,
    shutdown: Arc<Notify>,
    running: AtomicBool,
}

impl ReconciliationController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        aggregator: Arc<TelemetryAggregator>,
        engine: Arc<DecisionEngine>,
        audit: Arc<dyn AuditSink>,
        watched_namespaces: Vec<String>,
        default_bounds: Bounds,
        dry_run: bool,
        requeue_interval: Duration,
        request_rate_window: Duration,
    ) -> Self {
        Self {
            cluster,
            aggregator,
            engine,
            audit,
            queue: ReconcileQueue::new(),
            watched_namespaces,
            default_bounds,
            dry_run,
            requeue_interval,
            request_rate_window,
            shutdown: Arc::new(Notify::new()),
            running: AtomicBool::new(false),
        }
    }

    /// One full sweep: every currently-participating ingress gets one
    /// reconcile pass. Exposed separately from `start` so tests can
    /// drive a single sweep deterministically.
    pub async fn reconcile_once(&self) {
        let ingresses = match self
            .cluster
            .list_participating_ingresses(&self.watched_namespaces)
            .await
        {
            Ok(ingresses) => ingresses,
            Err(e) => {
                error!(error = %e, "reconcile sweep failed to list ingresses");
                return;
            }
        };
        for ingress in &ingresses {
            self.reconcile_ingress(ingress).await;
        }
    }

    /// Steps 2–4 of the pass algorithm for one already-fetched ingress.
    async fn reconcile_ingress(&self, ingress: &Ingress) {
        if !ingress.is_participating() {
            return;
        }

        for service_name in ingress.backend_service_names() {
            let effective_name = ingress.target_override().unwrap_or(&service_name);
            if let Err(e) = self.reconcile_service(ingress, effective_name).await {
                error!(
                    ingress = %ingress.name,
                    service = %service_name,
                    effective_service = %effective_name,
                    error = %e,
                    "reconcile failed for service, continuing with next"
                );
            }
        }
    }

    /// Step 4 of the pass algorithm, serialized per target by the
    /// keyed queue (§5). `service_name` is already resolved through the
    /// ingress's `target` override, if any (§6 annotation surface).
    async fn reconcile_service(&self, ingress: &Ingress, service_name: &str) -> Result<()> {
        let target = Target::new(&ingress.namespace, service_name);
        let _guard = self.queue.acquire(target.clone()).await;

        let Some(snapshot) = self.aggregator.latest(&target).await else {
            return Ok(());
        };

        let effective_bounds = Bounds {
            min_replicas: ingress.min_replicas_override().unwrap_or(self.default_bounds.min_replicas),
            max_replicas: ingress.max_replicas_override().unwrap_or(self.default_bounds.max_replicas),
        };

        let history = self.aggregator.history(&target).await;
        let Some(decision) = self.engine.decide(&snapshot, &history, effective_bounds) else {
            return Ok(());
        };

        if !decision.changes_replica_count() {
            return Ok(());
        }

        let service = self.find_service(&ingress.namespace, service_name).await?;
        let workloads = self.cluster.list_workloads(&ingress.namespace).await?;
        let Some(workload) = find_backing_workload(&service, &workloads) else {
            return Err(crate::error::Error::data_gap(format!(
                "no workload backs service {}/{service_name}",
                ingress.namespace
            )));
        };

        if self.dry_run {
            info!(
                target = %target,
                from = decision.current_replicas,
                to = decision.recommended_replicas,
                "dry-run: would scale (no mutation, no cooldown)"
            );
            return Ok(());
        }

        let now = SystemTime::now();
        let annotations = provenance::build(now, &decision.reasoning, decision.confidence);
        let patch = crate::cluster::WorkloadPatch {
            replicas: decision.recommended_replicas,
            annotations,
        };

        match self.cluster.update_workload(&workload.namespace, &workload.name, patch).await {
            Ok(()) => {
                let direction = decision
                    .direction()
                    .expect("changes_replica_count() true implies a direction");
                self.engine.record_commit(target.clone(), direction, now);
                self.audit.record(&decision).await;

                self.engine.add_training_sample(TrainingSample {
                    features: crate::decision::features::extract(
                        &snapshot,
                        &history,
                        self.request_rate_window,
                    ),
                    actual_scale: decision.scale_factor,
                    performance: 1.0,
                    timestamp: now,
                });
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                warn!(target = %target, "workload update conflict, deferring to next pass");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn find_service(&self, namespace: &str, name: &str) -> Result<ServiceRef> {
        let services = self.cluster.list_services(Some(namespace)).await?;
        services
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| crate::error::Error::data_gap(format!("no service {namespace}/{name}")))
    }

    /// Begin the periodic reconcile sweep; returns once `stop()` is
    /// called.
    pub async fn start(self: &Arc<Self>) {
        self.running.store(true, Ordering::SeqCst);
        let mut interval = tokio::time::interval(self.requeue_interval);
        info!(interval_secs = self.requeue_interval.as_secs(), "reconciliation controller starting");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.reconcile_once().await;
                }
                _ = self.shutdown.notified() => {
                    info!("reconciliation controller stopping");
                    break;
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

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
    use crate::cluster::resources::{Selector, Workload};
    use crate::cluster::InMemoryClusterClient;
    use crate::cluster::resources::{IngressPath, IngressRule};
    use crate::config::ScalingConfig;
    use crate::controller::audit::LogAuditSink;
    use crate::telemetry::source::MetricsSource;
    use crate::types::{MetricsSnapshot, ProxyStats};
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

    fn selector() -> Selector {
        Selector(HashMap::from([("app".into(), "web".into())]))
    }

    async fn setup(dry_run: bool) -> (Arc<InMemoryClusterClient>, Arc<ReconciliationController>, Arc<TelemetryAggregator>) {
        let cluster = InMemoryClusterClient::new();
        cluster.insert_service(ServiceRef {
            namespace: "ns".into(),
            name: "svc".into(),
            selector: selector(),
        });
        cluster.insert_workload(Workload {
            namespace: "ns".into(),
            name: "wl".into(),
            selector: selector(),
            current_replicas: 2,
            desired_replicas: 2,
            annotations: HashMap::new(),
        });
        cluster.insert_ingress(Ingress {
            namespace: "ns".into(),
            name: "ing".into(),
            annotations: HashMap::from([("enabled".into(), "true".into())]),
            rules: vec![IngressRule {
                paths: vec![IngressPath { path: "/".into(), backend_service: "svc".into() }],
            }],
        });

        let aggregator = Arc::new(TelemetryAggregator::new(
            crate::config::MetricsConfig::default(),
            Vec::new(),
            cluster.clone() as Arc<dyn ClusterClient>,
            Arc::new(NullSource),
        ));
        let mut snapshot = MetricsSnapshot::empty(Target::new("ns", "svc"), SystemTime::now());
        snapshot.cpu_utilization_pct = 90.0;
        snapshot.current_replicas = 2;
        snapshot.desired_replicas = 2;
        aggregator.history_store().append(snapshot).await;

        let engine = Arc::new(DecisionEngine::new(&ScalingConfig::default(), Duration::from_secs(300)));
        let controller = Arc::new(ReconciliationController::new(
            cluster.clone() as Arc<dyn ClusterClient>,
            Arc::clone(&aggregator),
            engine,
            Arc::new(LogAuditSink),
            Vec::new(),
            Bounds { min_replicas: 1, max_replicas: 10 },
            dry_run,
            Duration::from_secs(30),
            Duration::from_secs(300),
        ));
        (cluster, controller, aggregator)
    }

    #[tokio::test]
    async fn commits_a_scale_up_and_records_provenance() {
        let (cluster, controller, _aggregator) = setup(false).await;
        controller.reconcile_once().await;

        let workload = cluster.get_workload("ns", "wl").await.unwrap().unwrap();
        assert_eq!(workload.current_replicas, 3);
        assert!(workload.annotations.contains_key(provenance::LAST_SCALED));
    }

    #[tokio::test]
    async fn dry_run_never_mutates_the_workload() {
        let (cluster, controller, _aggregator) = setup(true).await;
        controller.reconcile_once().await;

        let workload = cluster.get_workload("ns", "wl").await.unwrap().unwrap();
        assert_eq!(workload.current_replicas, 2);
    }

    #[tokio::test]
    async fn second_pass_with_unchanged_snapshot_does_not_double_commit() {
        let (cluster, controller, _aggregator) = setup(false).await;
        controller.reconcile_once().await;
        controller.reconcile_once().await;

        let patches = cluster.applied_patches.get(&("ns".to_string(), "wl".to_string()));
        assert_eq!(patches.map(|p| p.len()).unwrap_or(0), 1);
    }

    #[tokio::test]
    async fn target_annotation_redirects_reconciliation_to_the_alternate_service() {
        let (cluster, controller, aggregator) = setup(false).await;

        // "alt-svc" is a distinct service/workload from the one named in
        // the ingress rule; the `target` annotation should redirect
        // reconciliation to it instead.
        let alt_selector = Selector(HashMap::from([("app".into(), "alt".into())]));
        cluster.insert_service(ServiceRef {
            namespace: "ns".into(),
            name: "alt-svc".into(),
            selector: alt_selector.clone(),
        });
        cluster.insert_workload(Workload {
            namespace: "ns".into(),
            name: "alt-wl".into(),
            selector: alt_selector,
            current_replicas: 2,
            desired_replicas: 2,
            annotations: HashMap::new(),
        });
        let mut snapshot = MetricsSnapshot::empty(Target::new("ns", "alt-svc"), SystemTime::now());
        snapshot.cpu_utilization_pct = 90.0;
        snapshot.current_replicas = 2;
        snapshot.desired_replicas = 2;
        aggregator.history_store().append(snapshot).await;

        let mut ingress = cluster.get_ingress("ns", "ing").await.unwrap().unwrap();
        ingress.annotations.insert("target".into(), "alt-svc".into());
        cluster.insert_ingress(ingress);

        controller.reconcile_once().await;

        let alt_workload = cluster.get_workload("ns", "alt-wl").await.unwrap().unwrap();
        assert_eq!(alt_workload.current_replicas, 3);

        // The literally-named service's workload is untouched: the
        // override redirected reconciliation away from it.
        let original_workload = cluster.get_workload("ns", "wl").await.unwrap().unwrap();
        assert_eq!(original_workload.current_replicas, 2);
    }

    #[tokio::test]
    async fn missing_snapshot_skips_without_error() {
        let (cluster, controller, aggregator) = setup(false).await;
        // Target with no snapshot: a second service on the same ingress.
        cluster.insert_service(ServiceRef {
            namespace: "ns".into(),
            name: "no-data".into(),
            selector: selector(),
        });
        let mut ingress = cluster.get_ingress("ns", "ing").await.unwrap().unwrap();
        ingress.rules[0].paths.push(IngressPath {
            path: "/other".into(),
            backend_service: "no-data".into(),
        });
        cluster.insert_ingress(ingress);

        controller.reconcile_once().await;
        assert!(aggregator.latest(&Target::new("ns", "no-data")).await.is_none());
    }
}
