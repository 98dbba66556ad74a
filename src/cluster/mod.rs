//! The external collaborator boundary: cluster resource descriptors and
//! the `ClusterClient` trait the aggregator and controller are built
//! against (§6, §9 of the specification).

pub mod client;
pub mod resources;

pub use client::{ClusterClient, InMemoryClusterClient};
pub use resources::{Ingress, PodInfo, ServiceRef, Workload, WorkloadPatch, WorkloadRef};

/// Find the workload backing a service: the one whose selector is a
/// superset match of the service's selector. More than one match is
/// broken deterministically by lexicographic name; zero matches returns
/// `None` (§4.1).
pub fn find_backing_workload<'a>(
    service: &ServiceRef,
    workloads: &'a [WorkloadRef],
) -> Option<&'a WorkloadRef> {
    let mut candidates: Vec<&WorkloadRef> = workloads
        .iter()
        .filter(|w| service.selector.is_subset_of(&w.selector))
        .collect();
    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    candidates.into_iter().next()
}
