//! The cluster API contract this crate consumes (§6). The actual
//! transport and credentialing are an out-of-scope external
//! collaborator's concern; this module only defines the trait and an
//! in-memory test double used by the test suite.

use crate::cluster::resources::{Ingress, PodInfo, ServiceRef, Workload, WorkloadPatch, WorkloadRef};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// List/get/update primitives the reconciliation controller and
/// telemetry aggregator need against the cluster. One production
/// implementation would wrap whatever cluster API client the deployment
/// brings; this crate ships only the trait plus `InMemoryClusterClient`.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<ServiceRef>>;
    async fn list_pods(&self, namespace: &str, service: &str) -> Result<Vec<PodInfo>>;
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadRef>>;
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Workload>>;
    async fn update_workload(
        &self,
        namespace: &str,
        name: &str,
        patch: WorkloadPatch,
    ) -> Result<()>;
    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Option<Ingress>>;
    async fn list_participating_ingresses(&self, namespaces: &[String]) -> Result<Vec<Ingress>>;
}

/// Test double backing the integration tests and `bin/hydraroute.rs`'s
/// dry-run demo path. Not a production cluster client.
#[derive(Debug, Default)]
pub struct InMemoryClusterClient {
    pub services: DashMap<(String, String), ServiceRef>,
    pub pods: DashMap<(String, String), Vec<PodInfo>>,
    pub workloads: DashMap<(String, String), Workload>,
    pub ingresses: DashMap<(String, String), Ingress>,
    /// Records of every committed update, for test assertions.
    pub applied_patches: DashMap<(String, String), Vec<WorkloadPatch>>,
    /// When set, the next `update_workload` for this key fails with a
    /// conflict error, simulating a concurrent modification (§4.3).
    pub inject_conflict: DashMap<(String, String), ()>,
}

impl InMemoryClusterClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_service(&self, svc: ServiceRef) {
        self.services
            .insert((svc.namespace.clone(), svc.name.clone()), svc);
    }

    pub fn insert_pods(&self, namespace: &str, service: &str, pods: Vec<PodInfo>) {
        self.pods.insert((namespace.to_string(), service.to_string()), pods);
    }

    pub fn insert_workload(&self, workload: Workload) {
        self.workloads
            .insert((workload.namespace.clone(), workload.name.clone()), workload);
    }

    pub fn insert_ingress(&self, ingress: Ingress) {
        self.ingresses
            .insert((ingress.namespace.clone(), ingress.name.clone()), ingress);
    }
}

#[async_trait]
impl ClusterClient for InMemoryClusterClient {
    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<ServiceRef>> {
        Ok(self
            .services
            .iter()
            .filter(|e| namespace.map_or(true, |ns| e.key().0 == ns))
            .map(|e| e.value().clone())
            .collect())
    }

    async fn list_pods(&self, namespace: &str, service: &str) -> Result<Vec<PodInfo>> {
        Ok(self
            .pods
            .get(&(namespace.to_string(), service.to_string()))
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadRef>> {
        Ok(self
            .workloads
            .iter()
            .filter(|e| e.key().0 == namespace)
            .map(|e| WorkloadRef {
                namespace: e.value().namespace.clone(),
                name: e.value().name.clone(),
                selector: e.value().selector.clone(),
            })
            .collect())
    }

    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Workload>> {
        Ok(self
            .workloads
            .get(&(namespace.to_string(), name.to_string()))
            .map(|v| v.clone()))
    }

    async fn update_workload(
        &self,
        namespace: &str,
        name: &str,
        patch: WorkloadPatch,
    ) -> Result<()> {
        let key = (namespace.to_string(), name.to_string());
        if self.inject_conflict.remove(&key).is_some() {
            return Err(crate::error::Error::cluster(format!(
                "conflict updating workload {namespace}/{name}"
            )));
        }
        if let Some(mut entry) = self.workloads.get_mut(&key) {
            entry.current_replicas = patch.replicas;
            entry.desired_replicas = patch.replicas;
            entry.annotations.extend(patch.annotations.clone());
        } else {
            return Err(crate::error::Error::cluster(format!(
                "workload {namespace}/{name} not found"
            )));
        }
        self.applied_patches.entry(key).or_default().push(patch);
        Ok(())
    }

    async fn get_ingress(&self, namespace: &str, name: &str) -> Result<Option<Ingress>> {
        Ok(self
            .ingresses
            .get(&(namespace.to_string(), name.to_string()))
            .map(|v| v.clone()))
    }

    async fn list_participating_ingresses(&self, namespaces: &[String]) -> Result<Vec<Ingress>> {
        Ok(self
            .ingresses
            .iter()
            .filter(|e| namespaces.is_empty() || namespaces.contains(&e.key().0))
            .map(|e| e.value().clone())
            .filter(|i| i.is_participating())
            .collect())
    }
}
