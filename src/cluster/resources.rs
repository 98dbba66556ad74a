//! Descriptor types for the cluster resources this crate reads and
//! writes: ingresses, services, workloads, and pods. These are the
//! shapes a `ClusterClient` implementation translates to and from
//! whatever transport it actually speaks (§6 of the specification).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A label selector, matched as "is this map a superset of mine" for
/// service-to-workload resolution (§4.1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector(pub HashMap<String, String>);

impl Selector {
    /// True if `other` contains every key/value pair in `self`.
    pub fn is_subset_of(&self, other: &Selector) -> bool {
        self.0
            .iter()
            .all(|(k, v)| other.0.get(k) == Some(v))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
    pub selector: Selector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub labels: HashMap<String, String>,
    /// CPU usage in cores.
    pub cpu_usage_cores: f64,
    /// Memory usage in MiB.
    pub memory_usage_mib: f64,
    /// Declared CPU request in cores.
    pub cpu_request_cores: f64,
    /// Declared memory request in MiB.
    pub memory_request_mib: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
    pub selector: Selector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    pub selector: Selector,
    pub current_replicas: u32,
    pub desired_replicas: u32,
    pub annotations: HashMap<String, String>,
}

/// A patch applied to a workload on commit: a new replica count plus the
/// provenance annotations written back (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadPatch {
    pub replicas: u32,
    pub annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressRule {
    pub paths: Vec<IngressPath>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressPath {
    pub path: String,
    pub backend_service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingress {
    pub namespace: String,
    pub name: String,
    pub annotations: HashMap<String, String>,
    pub rules: Vec<IngressRule>,
}

impl Ingress {
    /// An ingress participates iff its annotations contain
    /// `enabled = "true"` (§4.3). Missing `enabled` means not
    /// participating.
    pub fn is_participating(&self) -> bool {
        self.annotations.get("enabled").map(String::as_str) == Some("true")
    }

    /// Per-target bound overrides and alternate backend name carried as
    /// annotations (§6).
    pub fn min_replicas_override(&self) -> Option<u32> {
        self.annotations.get("min-replicas").and_then(|v| v.parse().ok())
    }

    pub fn max_replicas_override(&self) -> Option<u32> {
        self.annotations.get("max-replicas").and_then(|v| v.parse().ok())
    }

    pub fn target_override(&self) -> Option<&str> {
        self.annotations.get("target").map(String::as_str)
    }

    /// The distinct backend service names referenced by any path in any
    /// rule (§4.3 step 3).
    pub fn backend_service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rules
            .iter()
            .flat_map(|rule| rule.paths.iter())
            .map(|p| p.backend_service.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
