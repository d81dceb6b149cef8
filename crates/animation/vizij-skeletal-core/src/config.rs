//! Core configuration for vizij-skeletal-core.

use serde::{Deserialize, Serialize};

/// Tolerances and sizing hints shared by validation, blending and the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Allowed deviation of `|q|` from 1 before a rotation is rejected.
    pub unit_tolerance: f32,
    /// Blend weight sums at or below this are degenerate.
    pub blend_epsilon: f32,
    /// Initial capacity hint for per-joint scratch buffers.
    pub scratch_joints: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unit_tolerance: 1e-3,
            blend_epsilon: 1e-6,
            scratch_joints: 128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "blend_epsilon": 0.01 }"#).unwrap();
        assert_eq!(cfg.blend_epsilon, 0.01);
        assert_eq!(cfg.unit_tolerance, Config::default().unit_tolerance);
        assert_eq!(cfg.scratch_joints, 128);
    }
}
