//! Weighted composition of member predictors (§4.2). Members that error
//! (typically: untrained) are skipped and the remaining weights are
//! renormalized; if every member errors, the ensemble itself errors.

use super::Predictor;
use crate::error::{Error, Result};
use crate::types::{FeatureVector, Prediction, TrainingSample};

pub struct EnsemblePredictor {
    members: Vec<(Box<dyn Predictor>, f64)>,
}

impl EnsemblePredictor {
    pub fn new(members: Vec<(Box<dyn Predictor>, f64)>) -> Self {
        Self { members }
    }
}

impl Predictor for EnsemblePredictor {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let mut weighted_factor = 0.0;
        let mut weighted_confidence = 0.0;
        let mut total_weight = 0.0;

        for (member, weight) in &self.members {
            match member.predict(features) {
                Ok(prediction) => {
                    weighted_factor += prediction.scale_factor * weight;
                    weighted_confidence += prediction.confidence * weight;
                    total_weight += weight;
                }
                Err(_) => continue,
            }
        }

        if total_weight <= 0.0 {
            return Err(Error::model("every ensemble member failed to predict"));
        }

        Ok(Prediction {
            scale_factor: weighted_factor / total_weight,
            confidence: weighted_confidence / total_weight,
        })
    }

    fn train(&mut self, samples: &[TrainingSample]) -> Result<()> {
        let mut all_failed = true;
        for (member, _) in &mut self.members {
            if member.train(samples).is_ok() {
                all_failed = false;
            }
        }
        if all_failed {
            return Err(Error::model("every ensemble member failed to train"));
        }
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.members.iter().any(|(m, _)| m.is_trained())
    }

    fn name(&self) -> &'static str {
        "ensemble"
    }
}
