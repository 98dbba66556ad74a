//! The decision engine (C2): feature extraction, predictor dispatch with
//! Heuristic fallback, scale-factor projection, bounds clamping, cooldown
//! gating, and the online training buffer (§4.2).

use crate::config::ScalingConfig;
use crate::decision::cooldown::CooldownGate;
use crate::decision::features;
use crate::decision::predictor::{self, HeuristicPredictor, Predictor};
use crate::types::{Bounds, MetricsSnapshot, ScaleDirection, ScalingDecision, Target, TrainingSample};
use parking_lot::RwLock as SyncRwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{info, warn};

const TRAINING_BUFFER_CAP: usize = 10_000;
const RETRAIN_EVERY_N_SAMPLES: u64 = 100;

/// Turns a snapshot into a `ScalingDecision`, owning the predictor, its
/// online training buffer, and the per-target cooldown map.
pub struct DecisionEngine {
    predictor: Arc<SyncRwLock<Box<dyn Predictor>>>,
    heuristic_fallback: HeuristicPredictor,
    cooldown: CooldownGate,
    training_samples: SyncRwLock<VecDeque<TrainingSample>>,
    samples_since_retrain: AtomicU64,
    last_retrain_at: SyncRwLock<Option<Instant>>,
    retrain_interval: Duration,
    request_rate_window: Duration,
    confidence_threshold: f64,
    enable_online_learning: bool,
}

impl DecisionEngine {
    pub fn new(config: &ScalingConfig, request_rate_window: Duration) -> Self {
        let predictor = predictor::build(
            config.ai_model.model_type,
            config.scale_up_thresholds,
            config.scale_down_thresholds,
            &config.ai_model.feature_weights,
            config.ai_model.learning_rate,
        );
        Self {
            predictor: Arc::new(SyncRwLock::new(predictor)),
            heuristic_fallback: HeuristicPredictor::new(
                config.scale_up_thresholds,
                config.scale_down_thresholds,
            ),
            cooldown: CooldownGate::new(config.cooldown.clone()),
            training_samples: SyncRwLock::new(VecDeque::with_capacity(TRAINING_BUFFER_CAP)),
            samples_since_retrain: AtomicU64::new(0),
            last_retrain_at: SyncRwLock::new(None),
            retrain_interval: config.ai_model.retrain_interval,
            request_rate_window,
            confidence_threshold: config.prediction.confidence_threshold,
            enable_online_learning: config.ai_model.enable_online_learning,
        }
    }

    /// Returns `None` when the target is in cooldown or the snapshot is
    /// missing key fields (§4.2 contract).
    pub fn decide(
        &self,
        snapshot: &Arc<MetricsSnapshot>,
        history: &[Arc<MetricsSnapshot>],
        effective_bounds: Bounds,
    ) -> Option<ScalingDecision> {
        if snapshot.is_missing_key_fields() {
            return None;
        }
        if self.cooldown.is_blocked(&snapshot.target, snapshot.timestamp) {
            return None;
        }

        let features = features::extract(snapshot, history, self.request_rate_window);

        let prediction = {
            let guard = self.predictor.read();
            if guard.is_trained() {
                match guard.predict(&features) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!(error = %e, "active predictor failed, falling back to heuristic");
                        None
                    }
                }
            } else {
                None
            }
        };
        let prediction = match prediction {
            Some(p) => p,
            None => self
                .heuristic_fallback
                .predict(&features)
                .expect("heuristic predictor never fails"),
        };

        if prediction.confidence < self.confidence_threshold {
            warn!(
                confidence = prediction.confidence,
                threshold = self.confidence_threshold,
                target = %snapshot.target,
                "decision confidence below threshold, emitting anyway"
            );
        }

        let current = snapshot.current_replicas;
        let effective_current = if current == 0 { 1 } else { current } as f64;
        let factor = prediction.scale_factor;

        let projected: i64 = if (0.9..=1.1).contains(&factor) {
            effective_current as i64
        } else if factor > 1.1 {
            (effective_current * factor).ceil() as i64
        } else {
            (effective_current * factor).floor() as i64
        };
        let recommended = effective_bounds.clamp(projected);

        let reasoning = reasoning_string(snapshot, &features, factor, prediction.confidence);

        Some(ScalingDecision {
            target: snapshot.target.clone(),
            timestamp: snapshot.timestamp,
            current_replicas: current,
            recommended_replicas: recommended,
            scale_factor: factor,
            confidence: prediction.confidence,
            reasoning,
            source_snapshot: Arc::clone(snapshot),
        })
    }

    /// Called by the controller once a decision is actually committed
    /// (§4.3 step g): updates the per-direction cooldown clock.
    pub fn record_commit(&self, target: Target, direction: ScaleDirection, at: SystemTime) {
        self.cooldown.record(target, direction, at);
    }

    /// Append a training sample; every `RETRAIN_EVERY_N_SAMPLES` appended
    /// samples, dispatch an async retraining pass (§4.2 "Online
    /// training") that never blocks the decision path.
    pub fn add_training_sample(self: &Arc<Self>, sample: TrainingSample) {
        {
            let mut buf = self.training_samples.write();
            if buf.len() == TRAINING_BUFFER_CAP {
                buf.pop_front();
            }
            buf.push_back(sample);
        }

        if !self.enable_online_learning {
            return;
        }

        let count = self.samples_since_retrain.fetch_add(1, Ordering::SeqCst) + 1;
        if count % RETRAIN_EVERY_N_SAMPLES != 0 {
            return;
        }

        // `retrain_interval` is an upper bound on retrain cadence (§6): a
        // burst of samples can reach the count trigger well before this
        // much time has elapsed since the last retrain, in which case this
        // round is skipped rather than queued.
        let rate_limited = self
            .last_retrain_at
            .read()
            .is_some_and(|last| last.elapsed() < self.retrain_interval);
        if rate_limited {
            info!("retrain sample count reached but within retrain_interval, deferring");
            return;
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.retrain().await;
        });
    }

    async fn retrain(self: Arc<Self>) {
        let samples: Vec<TrainingSample> = self.training_samples.read().iter().cloned().collect();
        let predictor = Arc::clone(&self.predictor);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = predictor.write();
            guard.train(&samples)
        })
        .await;

        *self.last_retrain_at.write() = Some(Instant::now());
        match result {
            Ok(Ok(())) => info!("predictor retrained successfully"),
            Ok(Err(e)) => warn!(error = %e, "predictor retraining failed, keeping previous weights"),
            Err(e) => warn!(error = %e, "retraining task panicked"),
        }
    }
}

/// Deterministic reasoning string: which raw thresholds were crossed,
/// plus factor and confidence (§4.2).
fn reasoning_string(
    snapshot: &MetricsSnapshot,
    features: &crate::types::FeatureVector,
    factor: f64,
    confidence: f64,
) -> String {
    let mut crossed = Vec::new();
    if snapshot.cpu_utilization_pct > 80.0 {
        crossed.push("cpu>80".to_string());
    }
    if snapshot.memory_utilization_pct > 80.0 {
        crossed.push("memory>80".to_string());
    }
    if snapshot.requests_per_second > 100.0 {
        crossed.push("rps>100".to_string());
    }
    if snapshot.error_rate_pct > 5.0 {
        crossed.push("errors>5".to_string());
    }
    if snapshot.avg_response_time_ms > 1000.0 {
        crossed.push("responseTime>1000".to_string());
    }
    let _ = features;

    if crossed.is_empty() {
        format!("no thresholds crossed; factor={factor:.3}, confidence={confidence:.2}")
    } else {
        format!(
            "{}; factor={factor:.3}, confidence={confidence:.2}",
            crossed.join(", ")
        )
    }
}
