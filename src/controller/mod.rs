//! The reconciliation controller (C3): ingress participation, service
//! and workload resolution, the keyed reconcile queue, provenance
//! annotations, and the audit sink (§4.3).

pub mod audit;
pub mod provenance;
pub mod queue;
pub mod reconciler;

pub use audit::{AuditSink, LogAuditSink};
pub use reconciler::ReconciliationController;
