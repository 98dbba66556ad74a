//! The pluggable predictor family (§3, §4.2, §9): a capability with
//! `predict` and `train`, picked at construction from configuration.
//! Plain (non-async) because the decision path is CPU-bound and never
//! suspends on I/O (§5), the one place this crate departs from the
//! teacher's blanket `#[async_trait]` convention on capability traits.

pub mod ensemble;
pub mod heuristic;
pub mod linalg;
pub mod linear;
pub mod neural;

use crate::error::Result;
use crate::types::{FeatureVector, Prediction, TrainingSample};

/// A predictor: `predict(FeatureVector) -> (scaleFactor, confidence)` and
/// `train(samples)`. `scaleFactor` is always in `(0.5, 2.0)` by
/// construction (squashed through a logistic sigmoid where applicable).
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;
    fn train(&mut self, samples: &[TrainingSample]) -> Result<()>;
    fn is_trained(&self) -> bool;
    fn name(&self) -> &'static str;
}

/// Squash a raw linear score into `(0.5, 2.0)` via the logistic sigmoid,
/// the output transform shared by the Linear and Neural predictors
/// (§4.2).
pub fn squash(raw: f64) -> f64 {
    let sigmoid = 1.0 / (1.0 + (-raw).exp());
    0.5 + 1.5 * sigmoid
}

pub use ensemble::EnsemblePredictor;
pub use heuristic::HeuristicPredictor;
pub use linear::LinearPredictor;
pub use neural::NeuralPredictor;

/// Build the configured predictor variant, the Heuristic's thresholds
/// taken from configuration (§6 `scale_{up,down}_thresholds`) and the
/// Linear member seeded from `ai_model.feature_weights` so it can serve
/// before its first real training pass.
pub fn build(
    model_type: crate::config::ModelType,
    thresholds_up: crate::config::Thresholds,
    thresholds_down: crate::config::Thresholds,
    initial_feature_weights: &[f64],
    learning_rate: f64,
) -> Box<dyn Predictor> {
    use crate::config::ModelType;
    match model_type {
        ModelType::Heuristic => Box::new(HeuristicPredictor::new(thresholds_up, thresholds_down)),
        ModelType::Linear => Box::new(LinearPredictor::with_initial_weights(initial_feature_weights)),
        ModelType::NeuralNetwork => Box::new(NeuralPredictor::new(learning_rate)),
        ModelType::Ensemble => Box::new(EnsemblePredictor::new(vec![
            (
                Box::new(LinearPredictor::with_initial_weights(initial_feature_weights)) as Box<dyn Predictor>,
                0.6,
            ),
            (Box::new(NeuralPredictor::new(learning_rate)) as Box<dyn Predictor>, 0.4),
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_stays_within_open_bounds() {
        for raw in [-1000.0, -10.0, 0.0, 10.0, 1000.0] {
            let f = squash(raw);
            assert!(f > 0.5 && f < 2.0, "factor {f} out of bounds for raw {raw}");
        }
    }

    #[test]
    fn squash_of_zero_is_midpoint() {
        assert!((squash(0.0) - 1.25).abs() < 1e-9);
    }
}
