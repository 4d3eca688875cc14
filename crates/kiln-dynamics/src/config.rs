//! Typed configuration for the activation engine.
//!
//! Mirrors the `dynamics` section of the workspace's YAML configuration
//! document. All fields carry the published defaults and may be
//! individually overridden.

use serde::Deserialize;

/// Tunable constants governing spread, capture, Hebbian update, decay,
/// perturbation, and self-healing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DynamicsConfig {
    /// Damping applied to a source node's activation before it is summed
    /// into a target's pre-activation (`tanh(x_j * SPREAD_DAMPENING)`).
    #[serde(default = "default_spread_dampening")]
    pub spread_dampening: f64,

    /// Maximum number of spread steps before an un-captured trajectory
    /// escapes.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Number of consecutive steps an anchor's activation must stay at or
    /// above threshold before the trajectory is captured.
    #[serde(default = "default_min_capture_steps")]
    pub min_capture_steps: u32,

    /// Hebbian learning rate applied to edges along a captured path.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Per-unit multiplicative decay applied to edge weights during
    /// maintenance.
    #[serde(default = "default_decay_constant")]
    pub decay_constant: f64,

    /// Edges decaying below this weight are removed (subject to the
    /// reachability clamp).
    #[serde(default = "default_edge_removal_threshold")]
    pub edge_removal_threshold: f64,

    /// Lifetime-step cadence at which perturbation is injected.
    #[serde(default = "default_perturb_interval")]
    pub perturb_interval: u32,

    /// Half-width of the uniform perturbation noise band.
    #[serde(default = "default_perturb_strength")]
    pub perturb_strength: f64,

    /// Lifetime-step cadence at which self-healing runs.
    #[serde(default = "default_heal_interval")]
    pub heal_interval: u32,

    /// Activation level a node must cross to be recorded in a
    /// trajectory's canonical path.
    #[serde(default = "default_recording_threshold")]
    pub recording_threshold: f64,

    /// Whether escaped trajectories apply anti-Hebbian dampening
    /// (`W *= 0.999`) on traversed edges.
    #[serde(default)]
    pub anti_hebbian_enabled: bool,

    /// Weight assigned to a newly healed dead-zone edge.
    #[serde(default = "default_heal_edge_weight")]
    pub heal_edge_weight: f64,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            spread_dampening: default_spread_dampening(),
            max_steps: default_max_steps(),
            min_capture_steps: default_min_capture_steps(),
            learning_rate: default_learning_rate(),
            decay_constant: default_decay_constant(),
            edge_removal_threshold: default_edge_removal_threshold(),
            perturb_interval: default_perturb_interval(),
            perturb_strength: default_perturb_strength(),
            heal_interval: default_heal_interval(),
            recording_threshold: default_recording_threshold(),
            anti_hebbian_enabled: false,
            heal_edge_weight: default_heal_edge_weight(),
        }
    }
}

const fn default_spread_dampening() -> f64 {
    0.8
}

const fn default_max_steps() -> u32 {
    1000
}

const fn default_min_capture_steps() -> u32 {
    3
}

const fn default_learning_rate() -> f64 {
    0.01
}

const fn default_decay_constant() -> f64 {
    0.97
}

const fn default_edge_removal_threshold() -> f64 {
    0.01
}

const fn default_perturb_interval() -> u32 {
    100
}

const fn default_perturb_strength() -> f64 {
    0.7
}

const fn default_heal_interval() -> u32 {
    100
}

const fn default_recording_threshold() -> f64 {
    0.5
}

const fn default_heal_edge_weight() -> f64 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_published_defaults() {
        let config = DynamicsConfig::default();
        assert!((config.spread_dampening - 0.8).abs() < 1e-9);
        assert_eq!(config.max_steps, 1000);
        assert_eq!(config.min_capture_steps, 3);
        assert!((config.learning_rate - 0.01).abs() < 1e-9);
        assert!((config.decay_constant - 0.97).abs() < 1e-9);
        assert!(!config.anti_hebbian_enabled);
    }
}
