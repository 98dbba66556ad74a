//! Provenance annotations written back to the workload on a successful
//! commit (§4.3 step g, §6).

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::SystemTime;

pub const LAST_SCALED: &str = "last-scaled";
pub const SCALE_REASON: &str = "scale-reason";
pub const CONFIDENCE: &str = "confidence";

/// Build the three provenance annotations for a commit at `now`.
pub fn build(now: SystemTime, reasoning: &str, confidence: f64) -> HashMap<String, String> {
    let ts: DateTime<Utc> = now.into();
    HashMap::from([
        (LAST_SCALED.to_string(), ts.to_rfc3339()),
        (SCALE_REASON.to_string(), reasoning.to_string()),
        (CONFIDENCE.to_string(), format!("{confidence:.2}")),
    ])
}
