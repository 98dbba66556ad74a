//! Shared domain types for HydraRoute.
//!
//! Covers the data model in the specification: target identity, metrics
//! snapshots, feature vectors, training samples, cooldown entries, and
//! scaling decisions. Snapshots are immutable once constructed and are
//! always handed around behind `Arc` so the aggregator's store and the
//! engine's feature extraction never copy the whole struct.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// A scaling target: the `(namespace, serviceName)` pair all state is
/// keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub namespace: String,
    pub service: String,
}

impl Target {
    pub fn new(namespace: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.service)
    }
}

/// Direction of a committed scaling action, used to select the
/// per-direction cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleDirection {
    Up,
    Down,
}

/// Effective per-target replica bounds, after merging process-wide
/// defaults with any per-ingress annotation overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_replicas: u32,
    pub max_replicas: u32,
}

impl Bounds {
    pub fn clamp(&self, replicas: i64) -> u32 {
        let min = self.min_replicas as i64;
        let max = self.max_replicas as i64;
        replicas.clamp(min, max) as u32
    }
}

/// A time-stamped, immutable record of observed metrics for a target.
///
/// Only whole snapshots are appended to a target's history; individual
/// fields are never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub target: Target,
    pub timestamp: SystemTime,

    /// CPU utilization as a percentage of the declared request (0 if the
    /// request is 0).
    pub cpu_utilization_pct: f64,
    /// Memory utilization as a percentage of the declared request.
    pub memory_utilization_pct: f64,

    pub requests_per_second: f64,
    pub avg_response_time_ms: f64,
    pub error_rate_pct: f64,

    pub network_bandwidth_mbps: f64,
    pub io_bandwidth_mbps: f64,

    pub current_replicas: u32,
    pub desired_replicas: u32,

    pub ingress_class: Option<String>,
}

impl MetricsSnapshot {
    /// A snapshot with every field other than `target`/`timestamp` at its
    /// zero/sentinel value (the shape a phase failure leaves behind).
    pub fn empty(target: Target, timestamp: SystemTime) -> Self {
        Self {
            target,
            timestamp,
            cpu_utilization_pct: 0.0,
            memory_utilization_pct: 0.0,
            requests_per_second: 0.0,
            avg_response_time_ms: 0.0,
            error_rate_pct: 0.0,
            network_bandwidth_mbps: 0.0,
            io_bandwidth_mbps: 0.0,
            current_replicas: 0,
            desired_replicas: 0,
            ingress_class: None,
        }
    }

    /// No pods/no replicas observed, the condition under which the
    /// decision engine returns `None` rather than a decision (§4.2).
    pub fn is_missing_key_fields(&self) -> bool {
        self.current_replicas == 0 && self.desired_replicas == 0
    }
}

/// Normalized numeric input to a predictor, derived from a snapshot plus
/// temporal context and recent-history trends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureVector {
    pub cpu_utilization: f64,
    pub memory_utilization: f64,
    pub requests_per_second: f64,
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub network_bandwidth: f64,
    pub io_bandwidth: f64,
    /// Hour of day, normalized to `[0, 1)`.
    pub hour: f64,
    /// Day of week, normalized to `[0, 1)`.
    pub weekday: f64,
    pub cpu_trend: f64,
    pub memory_trend: f64,
    pub request_rate_trend: f64,
}

impl FeatureVector {
    /// The raw (un-normalized) fields in a fixed order, as consumed by
    /// the Linear and Neural predictors.
    pub fn as_array(&self) -> [f64; 12] {
        [
            self.cpu_utilization,
            self.memory_utilization,
            self.requests_per_second,
            self.avg_response_time,
            self.error_rate,
            self.network_bandwidth,
            self.io_bandwidth,
            self.hour,
            self.weekday,
            self.cpu_trend,
            self.memory_trend,
            self.request_rate_trend,
        ]
    }

    pub const DIMENSIONS: usize = 12;
}

/// `(FeatureVector, actualScale, performance, timestamp)`, appended to the
/// engine's bounded training ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub actual_scale: f64,
    pub performance: f64,
    pub timestamp: SystemTime,
}

/// Per-target record of the last committed scaling action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub last_commit: SystemTime,
    pub direction: ScaleDirection,
}

/// The output of the decision engine for one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingDecision {
    pub target: Target,
    pub timestamp: SystemTime,
    pub current_replicas: u32,
    pub recommended_replicas: u32,
    pub scale_factor: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub source_snapshot: Arc<MetricsSnapshot>,
}

impl ScalingDecision {
    pub fn changes_replica_count(&self) -> bool {
        self.recommended_replicas != self.current_replicas
    }

    pub fn direction(&self) -> Option<ScaleDirection> {
        use std::cmp::Ordering;
        match self.recommended_replicas.cmp(&self.current_replicas) {
            Ordering::Greater => Some(ScaleDirection::Up),
            Ordering::Less => Some(ScaleDirection::Down),
            Ordering::Equal => None,
        }
    }
}

/// A single prediction from a `Predictor`: a scale factor in `(0.5, 2.0)`
/// plus a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub scale_factor: f64,
    pub confidence: f64,
}

/// Raw proxy-statistics record returned by the ingress-frontend telemetry
/// source (§6 of the specification).
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyStats {
    pub requests_per_second: f64,
    pub response_time: f64,
    pub error_rate: f64,
    pub active_connections: u64,
    pub bytes_per_second: f64,
    #[serde(default)]
    pub upstream_metrics: HashMap<String, f64>,
}
