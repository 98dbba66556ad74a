//! HydraRoute: a cluster-resident control-plane component that adjusts
//! the replica count of backend workloads behind HTTP ingresses, using a
//! multi-signal decision engine rather than a single-metric threshold.
//!
//! Three components, leaves first:
//!
//! - [`telemetry`] (the aggregator, C1): periodic collection into a
//!   bounded per-target history.
//! - [`decision`] (the decision engine, C2): feature extraction, the
//!   pluggable predictor family, and scale-factor projection under
//!   bounds and cooldown.
//! - [`controller`] (the reconciliation controller, C3): ingress to
//!   service to workload resolution and commit with provenance.
//!
//! The cluster API client itself, authentication, leader election, and
//! process-level logging setup are external collaborators; this crate
//! depends only on their trait contracts (see [`cluster::client`]).

pub mod cluster;
pub mod config;
pub mod controller;
pub mod decision;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
