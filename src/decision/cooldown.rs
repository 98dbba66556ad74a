//! Per-target cooldown gate (§4.2, §9 "Source cooldown ... direction-
//! specific cooldown based on the last recorded direction").

use crate::config::CooldownConfig;
use crate::types::{CooldownEntry, ScaleDirection, Target};
use dashmap::DashMap;
use std::time::SystemTime;

#[derive(Default)]
pub struct CooldownGate {
    entries: DashMap<Target, CooldownEntry>,
    config: CooldownConfig,
}

impl CooldownGate {
    pub fn new(config: CooldownConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// True if a commit for `target` is currently blocked by cooldown.
    pub fn is_blocked(&self, target: &Target, now: SystemTime) -> bool {
        let Some(entry) = self.entries.get(target) else {
            return false;
        };
        let elapsed = now.duration_since(entry.last_commit).unwrap_or_default();
        let required = match entry.direction {
            ScaleDirection::Up => self.config.scale_up_cooldown,
            ScaleDirection::Down => self.config.scale_down_cooldown,
        };
        elapsed < required
    }

    /// Record a committed scaling action, updating the cooldown clock.
    pub fn record(&self, target: Target, direction: ScaleDirection, now: SystemTime) {
        self.entries.insert(
            target,
            CooldownEntry {
                last_commit: now,
                direction,
            },
        );
    }
}
