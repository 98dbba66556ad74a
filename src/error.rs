//! Crate-wide error taxonomy for HydraRoute.
//!
//! Mirrors the error-handling policy table in the specification: each
//! variant corresponds to one error kind (configuration, transient
//! upstream, data gap, model, cluster API, invariant violation), and
//! callers in the aggregator/engine/controller loops match on these to
//! decide whether to log-and-continue or to abort startup.

use thiserror::Error;

/// Error type for every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, rejected at load time. Fatal at startup.
    #[error("configuration error: {message}")]
    Config {
        message: String,
        field: Option<String>,
    },

    /// A transient failure talking to an external telemetry source or the
    /// cluster API. Callers log and retry on the next cycle.
    #[error("transient upstream error ({source_name}): {message}")]
    Upstream {
        message: String,
        source_name: String,
    },

    /// A required input was missing (no snapshot, no backing workload).
    /// Callers treat this as "skip this target" rather than an error to
    /// surface.
    #[error("data gap: {message}")]
    DataGap { message: String },

    /// A predictor failed to train or predict.
    #[error("model error: {message}")]
    Model { message: String },

    /// The cluster API client reported a failure (including update
    /// conflicts, which callers treat as transient).
    #[error("cluster API error: {message}")]
    Cluster { message: String },

    /// An internal invariant was violated (e.g. a negative computed
    /// replica count). Logged at error level and clamped rather than
    /// propagated.
    #[error("invariant violation: {message}")]
    Invariant { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            field: None,
        }
    }

    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn upstream(message: impl Into<String>, source_name: impl Into<String>) -> Self {
        Error::Upstream {
            message: message.into(),
            source_name: source_name.into(),
        }
    }

    pub fn data_gap(message: impl Into<String>) -> Self {
        Error::DataGap {
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        Error::Model {
            message: message.into(),
        }
    }

    pub fn cluster(message: impl Into<String>) -> Self {
        Error::Cluster {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Error::Invariant {
            message: message.into(),
        }
    }

    /// Whether the cluster API reported this as a concurrent-modification
    /// conflict, which the controller treats as transient (§4.3).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Cluster { message } if message.contains("conflict"))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
