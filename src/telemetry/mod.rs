//! The telemetry aggregator (C1): collection cycle, per-target bounded
//! history, and the fault-tolerant collection phases it composes (§4.1).

pub mod aggregator;
pub mod history;
pub mod phases;
pub mod source;

pub use aggregator::TelemetryAggregator;
pub use history::HistoryStore;
pub use source::{MetricsSource, ReqwestMetricsSource};
