//! Configuration for HydraRoute, covering every option enumerated in §6
//! of the specification: metrics collection, scaling bounds and
//! predictor selection, cooldown, and general process behavior.
//!
//! `Config::load` reads and parses a TOML file and validates it;
//! discovering *which* file to load (env var, CLI flag, mounted
//! ConfigMap) is left to the process wiring in `bin/hydraroute.rs`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub metrics: MetricsConfig,
    pub scaling: ScalingConfig,
    pub general: GeneralConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics: MetricsConfig::default(),
            scaling: ScalingConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the specification's validation rules
    /// (§6) disallow: `min < 1`, `max < min`, `learning_rate` out of
    /// `(0,1)`, `confidence_threshold` out of `(0,1)`.
    pub fn validate(&self) -> Result<()> {
        if self.scaling.min_replicas < 1 {
            return Err(Error::config_field(
                "min_replicas must be at least 1",
                "scaling.min_replicas",
            ));
        }
        if self.scaling.max_replicas < self.scaling.min_replicas {
            return Err(Error::config_field(
                "max_replicas must be >= min_replicas",
                "scaling.max_replicas",
            ));
        }
        let lr = self.scaling.ai_model.learning_rate;
        if !(lr > 0.0 && lr < 1.0) {
            return Err(Error::config_field(
                "learning_rate must be in (0, 1)",
                "scaling.ai_model.learning_rate",
            ));
        }
        let ct = self.scaling.prediction.confidence_threshold;
        if !(ct > 0.0 && ct < 1.0) {
            return Err(Error::config_field(
                "confidence_threshold must be in (0, 1)",
                "scaling.prediction.confidence_threshold",
            ));
        }
        Ok(())
    }

    /// The effective bounds for a target before any per-ingress
    /// annotation overrides are applied.
    pub fn default_bounds(&self) -> crate::types::Bounds {
        crate::types::Bounds {
            min_replicas: self.scaling.min_replicas,
            max_replicas: self.scaling.max_replicas,
        }
    }
}

/// Telemetry collection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    #[serde(with = "duration_secs")]
    pub collection_interval: Duration,
    #[serde(with = "duration_secs")]
    pub retention_period: Duration,
    #[serde(with = "duration_secs")]
    pub request_rate_window: Duration,
    /// Proxy-statistics endpoint; empty disables the ingress-frontend
    /// phase.
    pub nginx_metrics_url: String,
    pub bandwidth_monitoring: BandwidthMonitoringConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            collection_interval: Duration::from_secs(30),
            retention_period: Duration::from_secs(24 * 3600),
            request_rate_window: Duration::from_secs(5 * 60),
            nginx_metrics_url: String::new(),
            bandwidth_monitoring: BandwidthMonitoringConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwidthMonitoringConfig {
    pub enabled: bool,
    #[serde(with = "duration_secs")]
    pub period: Duration,
}

impl Default for BandwidthMonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: Duration::from_secs(30),
        }
    }
}

/// Scaling decision configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub min_replicas: u32,
    pub max_replicas: u32,
    /// Unused by the core timer (controller requeue governs cadence);
    /// reserved for a future evaluation loop.
    #[serde(with = "duration_secs")]
    pub evaluation_interval: Duration,
    pub scale_up_thresholds: Thresholds,
    pub scale_down_thresholds: Thresholds,
    pub ai_model: AiModelConfig,
    pub cooldown: CooldownConfig,
    pub prediction: PredictionConfig,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_replicas: 1,
            max_replicas: 10,
            evaluation_interval: Duration::from_secs(30),
            scale_up_thresholds: Thresholds {
                cpu: 80.0,
                memory: 80.0,
                requests_per_second: 100.0,
            },
            scale_down_thresholds: Thresholds {
                cpu: 30.0,
                memory: 30.0,
                requests_per_second: 10.0,
            },
            ai_model: AiModelConfig::default(),
            cooldown: CooldownConfig::default(),
            prediction: PredictionConfig::default(),
        }
    }
}

/// Thresholds feeding the Heuristic predictor's reasoning layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu: f64,
    pub memory: f64,
    pub requests_per_second: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Heuristic,
    Linear,
    NeuralNetwork,
    Ensemble,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiModelConfig {
    pub model_type: ModelType,
    pub learning_rate: f64,
    pub enable_online_learning: bool,
    #[serde(with = "duration_secs")]
    pub retrain_interval: Duration,
    pub feature_weights: Vec<f64>,
}

impl Default for AiModelConfig {
    fn default() -> Self {
        Self {
            model_type: ModelType::Heuristic,
            learning_rate: 0.01,
            enable_online_learning: true,
            retrain_interval: Duration::from_secs(300),
            feature_weights: vec![0.0; crate::types::FeatureVector::DIMENSIONS],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    #[serde(with = "duration_secs")]
    pub scale_up_cooldown: Duration,
    #[serde(with = "duration_secs")]
    pub scale_down_cooldown: Duration,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            scale_up_cooldown: Duration::from_secs(3 * 60),
            scale_down_cooldown: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub confidence_threshold: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
        }
    }
}

/// General process behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub dry_run: bool,
    #[serde(with = "duration_secs")]
    pub requeue_interval: Duration,
    pub watched_namespaces: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            requeue_interval: Duration::from_secs(30),
            watched_namespaces: Vec::new(),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
