//! The decision engine (C2): feature extraction, the predictor family,
//! cooldown gating, and scale-factor projection (§4.2).

pub mod cooldown;
pub mod engine;
pub mod features;
pub mod predictor;

pub use cooldown::CooldownGate;
pub use engine::DecisionEngine;
