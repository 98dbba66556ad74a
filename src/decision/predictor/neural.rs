//! Two-layer feed-forward network with sigmoid activations, squashed
//! through the shared output transform (§4.2, §9). Falls back to the
//! untrained state (and so to the Heuristic, via the engine) until
//! `train` has been called at least once.

use super::{squash, Predictor};
use crate::error::{Error, Result};
use crate::types::{FeatureVector, Prediction, TrainingSample};
use parking_lot::RwLock;

const HIDDEN_UNITS: usize = 8;
const DEFAULT_LEARNING_RATE: f64 = 0.05;
const EPOCHS: usize = 200;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Deterministic pseudo-random weight seed, avoiding a dependency on a
/// random-number crate for a network this small.
fn seed(i: usize, j: usize) -> f64 {
    let raw = ((i * 31 + j * 17 + 7) % 23) as f64;
    (raw / 23.0) - 0.5
}

struct Network {
    w1: Vec<Vec<f64>>, // [hidden][input]
    b1: Vec<f64>,
    w2: Vec<f64>, // [hidden]
    b2: f64,
}

impl Network {
    fn init() -> Self {
        let w1 = (0..HIDDEN_UNITS)
            .map(|i| (0..FeatureVector::DIMENSIONS).map(|j| seed(i, j)).collect())
            .collect();
        let b1 = vec![0.0; HIDDEN_UNITS];
        let w2 = (0..HIDDEN_UNITS).map(|i| seed(i, i + 1)).collect();
        Self { w1, b1, w2, b2: 0.0 }
    }

    fn forward(&self, x: &[f64; 12]) -> (Vec<f64>, f64) {
        let hidden: Vec<f64> = (0..HIDDEN_UNITS)
            .map(|i| {
                let z: f64 = self.w1[i].iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + self.b1[i];
                sigmoid(z)
            })
            .collect();
        let raw = hidden.iter().zip(&self.w2).map(|(h, w)| h * w).sum::<f64>() + self.b2;
        (hidden, raw)
    }

    fn predict(&self, x: &[f64; 12]) -> f64 {
        let (_, raw) = self.forward(x);
        squash(raw)
    }

    fn train_epoch(&mut self, samples: &[TrainingSample], learning_rate: f64) {
        for sample in samples {
            let x = sample.features.as_array();
            let (hidden, raw) = self.forward(&x);
            let sig = sigmoid(raw);
            let pred = 0.5 + 1.5 * sig;

            let d_loss_d_pred = 2.0 * (pred - sample.actual_scale);
            let d_pred_d_raw = 1.5 * sig * (1.0 - sig);
            let d_loss_d_raw = d_loss_d_pred * d_pred_d_raw;

            let mut w2_grad = vec![0.0; HIDDEN_UNITS];
            for i in 0..HIDDEN_UNITS {
                w2_grad[i] = d_loss_d_raw * hidden[i];
            }
            let b2_grad = d_loss_d_raw;

            for i in 0..HIDDEN_UNITS {
                let d_loss_d_h = d_loss_d_raw * self.w2[i];
                let d_h_d_z = hidden[i] * (1.0 - hidden[i]);
                let d_loss_d_z = d_loss_d_h * d_h_d_z;

                for j in 0..FeatureVector::DIMENSIONS {
                    self.w1[i][j] -= learning_rate * d_loss_d_z * x[j];
                }
                self.b1[i] -= learning_rate * d_loss_d_z;
            }

            for i in 0..HIDDEN_UNITS {
                self.w2[i] -= learning_rate * w2_grad[i];
            }
            self.b2 -= learning_rate * b2_grad;
        }
    }
}

pub struct NeuralPredictor {
    network: RwLock<Option<Network>>,
    learning_rate: f64,
}

impl NeuralPredictor {
    /// `learning_rate` comes from configuration (§6 `ai_model.learning_rate`,
    /// validated to `(0, 1)` at load time).
    pub fn new(learning_rate: f64) -> Self {
        Self {
            network: RwLock::new(None),
            learning_rate,
        }
    }
}

impl Default for NeuralPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE)
    }
}

impl Predictor for NeuralPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let guard = self.network.read();
        let Some(network) = guard.as_ref() else {
            return Err(Error::model("neural predictor has not been trained"));
        };
        Ok(Prediction {
            scale_factor: network.predict(&features.as_array()),
            confidence: 0.9,
        })
    }

    fn train(&mut self, samples: &[TrainingSample]) -> Result<()> {
        if samples.is_empty() {
            return Err(Error::model("neural predictor requires at least one sample"));
        }

        let mut network = Network::init();

        for _ in 0..EPOCHS {
            network.train_epoch(samples, self.learning_rate);
        }

        *self.network.write() = Some(network);
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.network.read().is_some()
    }

    fn name(&self) -> &'static str {
        "neural"
    }
}
