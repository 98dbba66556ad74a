//! Deterministic threshold rules on raw features (§4.2). Always ready
//! (no training step), and the fallback the engine reaches for whenever
//! the configured predictor reports `is_trained() == false`.

use super::Predictor;
use crate::config::Thresholds;
use crate::error::Result;
use crate::types::{FeatureVector, Prediction, TrainingSample};

pub struct HeuristicPredictor {
    scale_up: Thresholds,
    scale_down: Thresholds,
}

impl HeuristicPredictor {
    pub fn new(scale_up: Thresholds, scale_down: Thresholds) -> Self {
        Self { scale_up, scale_down }
    }
}

impl Default for HeuristicPredictor {
    fn default() -> Self {
        let scaling = crate::config::ScalingConfig::default();
        Self::new(scaling.scale_up_thresholds, scaling.scale_down_thresholds)
    }
}

impl Predictor for HeuristicPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let cpu_pct = features.cpu_utilization * 100.0;
        let mem_pct = features.memory_utilization * 100.0;
        let rps = features.requests_per_second * 1000.0;

        let cpu_factor = if cpu_pct > self.scale_up.cpu {
            1.5
        } else if cpu_pct < self.scale_down.cpu {
            0.7
        } else {
            1.0
        };
        let mem_factor = if mem_pct > self.scale_up.memory {
            1.3
        } else if mem_pct < self.scale_down.memory {
            0.8
        } else {
            1.0
        };
        let rps_factor = if rps > self.scale_up.requests_per_second {
            1.2
        } else if rps < self.scale_down.requests_per_second {
            0.9
        } else {
            1.0
        };

        // Raw multiplicative combination can exceed (0.5, 2.0) (e.g. 1.5 * 1.3 * 1.2 = 2.34);
        // every predictor output is squashed into the open interval (§3).
        let factor = (cpu_factor * mem_factor * rps_factor).clamp(0.501, 1.999);

        Ok(Prediction {
            scale_factor: factor,
            confidence: 0.5,
        })
    }

    fn train(&mut self, _samples: &[TrainingSample]) -> Result<()> {
        Ok(())
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
