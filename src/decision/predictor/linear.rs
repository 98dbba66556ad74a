//! Trained linear model: `raw = bias + sum(w_i * x_i)`, squashed through
//! the shared sigmoid transform. Trained by ordinary least squares over
//! the normal equation `w = (X^T X)^-1 X^T y` (§4.2), a closed-form solve
//! with no gradient step, so `ai_model.learning_rate` has no effect here
//! (it governs the Neural predictor's backpropagation instead).

use super::{linalg, squash, Predictor};
use crate::error::{Error, Result};
use crate::types::{FeatureVector, Prediction, TrainingSample};
use parking_lot::RwLock;

const MIN_TRAINING_SAMPLES: usize = 10;

struct Weights {
    bias: f64,
    coefficients: Vec<f64>,
}

pub struct LinearPredictor {
    weights: RwLock<Option<Weights>>,
}

impl LinearPredictor {
    pub fn new() -> Self {
        Self {
            weights: RwLock::new(None),
        }
    }

    /// Seed with configured initial coefficients (§6
    /// `ai_model.feature_weights`), used as a bias-free starting point so
    /// the predictor can serve before its first real training pass. A
    /// weight vector of the wrong length or all zeros leaves the
    /// predictor untrained, same as `new()`.
    pub fn with_initial_weights(initial: &[f64]) -> Self {
        let weights = if initial.len() == FeatureVector::DIMENSIONS && initial.iter().any(|w| *w != 0.0) {
            Some(Weights {
                bias: 0.0,
                coefficients: initial.to_vec(),
            })
        } else {
            None
        };
        Self {
            weights: RwLock::new(weights),
        }
    }
}

impl Default for LinearPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let guard = self.weights.read();
        let Some(weights) = guard.as_ref() else {
            return Err(Error::model("linear predictor has not been trained"));
        };
        let raw = weights.bias
            + features
                .as_array()
                .iter()
                .zip(&weights.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        Ok(Prediction {
            scale_factor: squash(raw),
            confidence: 0.8,
        })
    }

    fn train(&mut self, samples: &[TrainingSample]) -> Result<()> {
        if samples.len() < MIN_TRAINING_SAMPLES {
            return Err(Error::model(format!(
                "linear predictor requires at least {MIN_TRAINING_SAMPLES} samples, got {}",
                samples.len()
            )));
        }

        // Design matrix with a leading bias column of ones.
        let design: Vec<Vec<f64>> = samples
            .iter()
            .map(|s| {
                let mut row = vec![1.0];
                row.extend_from_slice(&s.features.as_array());
                row
            })
            .collect();
        let targets: Vec<f64> = samples.iter().map(|s| s.actual_scale).collect();

        let gram = linalg::gram(&design);
        let Some(gram_inv) = linalg::invert(&gram) else {
            // Non-invertible X^T X: training fails without altering the
            // previous weights (§4.2).
            return Err(Error::model("normal equation matrix is non-invertible"));
        };
        let xty = linalg::transpose_mul_vec(&design, &targets);
        let solved = linalg::mat_vec_mul(&gram_inv, &xty);

        let weights = Weights {
            bias: solved[0],
            coefficients: solved[1..].to_vec(),
        };
        *self.weights.write() = Some(weights);
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.weights.read().is_some()
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
