//! The scaling audit record sink: an opaque collaborator whose only
//! contract is "at-least-once per committed change" (§9 "Eventing").
//! This crate ships a log-only implementation; a deployment may swap in
//! a cluster-event emitter without changing the controller.

use crate::types::ScalingDecision;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, decision: &ScalingDecision);
}

pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, decision: &ScalingDecision) {
        info!(
            target = %decision.target,
            from = decision.current_replicas,
            to = decision.recommended_replicas,
            confidence = decision.confidence,
            reasoning = %decision.reasoning,
            "scaling commit"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricsSnapshot, Target};
    use std::sync::Arc;
    use std::time::SystemTime;

    #[tokio::test]
    async fn log_sink_does_not_panic() {
        let sink = LogAuditSink;
        let target = Target::new("ns", "svc");
        let decision = ScalingDecision {
            target: target.clone(),
            timestamp: SystemTime::now(),
            current_replicas: 2,
            recommended_replicas: 3,
            scale_factor: 1.5,
            confidence: 0.8,
            reasoning: "cpu>80".into(),
            source_snapshot: Arc::new(MetricsSnapshot::empty(target, SystemTime::now())),
        };
        sink.record(&decision).await;
    }
}
