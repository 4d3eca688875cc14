//! Typed configuration for the coherence evaluator.

use serde::Deserialize;

/// Tunable constants governing stimulus sampling and the coherence
/// verdict thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoherenceConfig {
    /// Number of stimulus concepts sampled per evaluation.
    #[serde(default = "default_n_stimuli")]
    pub n_stimuli: u32,

    /// Minimum Foundation (V01) capture rate for a `Coherent` verdict.
    #[serde(default = "default_foundation_threshold")]
    pub foundation_threshold: f64,

    /// Minimum mean Aspirational capture rate for a `Coherent` verdict.
    #[serde(default = "default_aspirational_threshold")]
    pub aspirational_threshold: f64,

    /// Minimum count of distinct anchors captured at least once for a
    /// `Coherent` verdict.
    #[serde(default = "default_min_coverage")]
    pub min_coverage: u32,

    /// Maximum allowed single-anchor capture share for a `Coherent`
    /// verdict.
    #[serde(default = "default_max_dominance")]
    pub max_dominance: f64,

    /// Minimum `growth_delta` for a `Growing` verdict.
    #[serde(default = "default_growth_threshold")]
    pub growth_threshold: f64,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            n_stimuli: default_n_stimuli(),
            foundation_threshold: default_foundation_threshold(),
            aspirational_threshold: default_aspirational_threshold(),
            min_coverage: default_min_coverage(),
            max_dominance: default_max_dominance(),
            growth_threshold: default_growth_threshold(),
        }
    }
}

const fn default_n_stimuli() -> u32 {
    100
}

const fn default_foundation_threshold() -> f64 {
    0.99
}

const fn default_aspirational_threshold() -> f64 {
    0.80
}

const fn default_min_coverage() -> u32 {
    10
}

const fn default_max_dominance() -> f64 {
    0.40
}

const fn default_growth_threshold() -> f64 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_published_defaults() {
        let config = CoherenceConfig::default();
        assert_eq!(config.n_stimuli, 100);
        assert!((config.foundation_threshold - 0.99).abs() < 1e-9);
        assert!((config.aspirational_threshold - 0.80).abs() < 1e-9);
        assert_eq!(config.min_coverage, 10);
        assert!((config.max_dominance - 0.40).abs() < 1e-9);
        assert!((config.growth_threshold - 0.05).abs() < 1e-9);
    }
}
