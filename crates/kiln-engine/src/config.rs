//! Tunable constants for the Kiln loop, plus the top-level configuration
//! document that bundles every crate's config into one YAML file.
//!
//! Per-field `#[serde(default = "fn")]` so a partial document still
//! deserializes, a matching `impl Default`, and an `apply_env_overrides`
//! step for the one infrastructure value that has an environment variable.

use std::io;
use std::path::Path;

use kiln_coherence::CoherenceConfig;
use kiln_dynamics::DynamicsConfig;
use kiln_mercy::MercyConfig;

use crate::selection::Selection;

/// Tunable constants for the Kiln evolutionary loop (C7).
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct KilnConfig {
    /// Target population size; offspring are bred to refill slots vacated
    /// by dissolution, not to grow the population past this size.
    #[serde(default = "default_population")]
    pub population: u32,

    /// Hard ceiling on the number of generations [`crate::engine::Engine::run`]
    /// will execute before stopping regardless of coherence.
    #[serde(default = "default_max_generations")]
    pub max_generations: u32,

    /// Stop early once at least this fraction of the population is
    /// [`kiln_types::CoherenceVerdict::Coherent`].
    #[serde(default = "default_target_fraction")]
    pub target_fraction: f64,

    /// Per-edge probability of Gaussian jitter during mutation.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,

    /// Standard deviation of the Gaussian jitter applied to a mutated edge.
    #[serde(default = "default_mutation_noise_sigma")]
    pub mutation_noise_sigma: f64,

    /// Once-per-mutation-call probability of adding a new concept-to-anchor
    /// edge.
    #[serde(default = "default_p_add")]
    pub p_add: f64,

    /// Once-per-mutation-call probability of removing the weakest edge
    /// (skipped if removal would break anchor reachability).
    #[serde(default = "default_p_del")]
    pub p_del: f64,

    /// Probability that an offspring is produced via crossover of two
    /// parents rather than a straight clone of one parent.
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,

    /// Number of fittest survivors exempt from dissolution each generation
    /// regardless of mercy state.
    #[serde(default = "default_elites")]
    pub elites: usize,

    /// Parent-selection strategy.
    #[serde(default)]
    pub selection: Selection,

    /// Consecutive `Struggling`/`FoundationFailed` generations (with no
    /// growth) an agent is given before becoming a dissolution candidate.
    #[serde(default = "default_grace_period")]
    pub grace_period: u32,

    /// Stimuli sampled per agent per generation during the internal
    /// Hebbian training pass. Not named in the virtue/dynamics tables;
    /// an ambient addition needed to drive learning, distinct from
    /// `CoherenceConfig::n_stimuli` which governs read-only scoring.
    #[serde(default = "default_n_training_stimuli")]
    pub n_training_stimuli: u32,
}

const fn default_population() -> u32 {
    50
}
const fn default_max_generations() -> u32 {
    100
}
const fn default_target_fraction() -> f64 {
    0.5
}
const fn default_mutation_rate() -> f64 {
    0.1
}
const fn default_mutation_noise_sigma() -> f64 {
    0.05
}
const fn default_p_add() -> f64 {
    0.02
}
const fn default_p_del() -> f64 {
    0.02
}
const fn default_crossover_rate() -> f64 {
    0.7
}
const fn default_elites() -> usize {
    2
}
const fn default_grace_period() -> u32 {
    3
}
const fn default_n_training_stimuli() -> u32 {
    20
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            max_generations: default_max_generations(),
            target_fraction: default_target_fraction(),
            mutation_rate: default_mutation_rate(),
            mutation_noise_sigma: default_mutation_noise_sigma(),
            p_add: default_p_add(),
            p_del: default_p_del(),
            crossover_rate: default_crossover_rate(),
            elites: default_elites(),
            selection: Selection::default(),
            grace_period: default_grace_period(),
            n_training_stimuli: default_n_training_stimuli(),
        }
    }
}

/// The one infrastructure value a deployment tends to override per
/// environment rather than per experiment.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct InfrastructureConfig {
    /// Connection string for the persistence backend, e.g.
    /// `falkordb://localhost:6379/soul-kiln`.
    #[serde(default = "default_store_url")]
    pub store_url: String,
}

fn default_store_url() -> String {
    "falkordb://127.0.0.1:6379/soul-kiln".to_owned()
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self { store_url: default_store_url() }
    }
}

impl InfrastructureConfig {
    /// Apply the `SOUL_KILN_STORE_URL` environment override, if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SOUL_KILN_STORE_URL") {
            self.store_url = url;
        }
    }
}

/// The full configuration document: every crate's tunables plus
/// infrastructure, loaded from one YAML file.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, Default)]
pub struct SimulationConfig {
    /// Activation spread and learning/maintenance constants (C3).
    #[serde(default)]
    pub dynamics: DynamicsConfig,
    /// Coherence scoring constants (C4).
    #[serde(default)]
    pub coherence: CoherenceConfig,
    /// Mercy Machine constants (C6).
    #[serde(default)]
    pub mercy: MercyConfig,
    /// Kiln evolutionary loop constants (C7).
    #[serde(default)]
    pub kiln: KilnConfig,
    /// Deployment-specific infrastructure settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
}

/// Errors raised while loading or parsing a [`SimulationConfig`] document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {source}")]
    Io {
        /// The underlying I/O failure.
        #[from]
        source: io::Error,
    },
    /// The configuration file's contents were not valid YAML for this shape.
    #[error("failed to parse configuration: {source}")]
    Yaml {
        /// The underlying parse failure.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl SimulationConfig {
    /// Load and parse a configuration document from `path`, applying
    /// environment overrides afterward.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse a configuration document from a YAML string, applying
    /// environment overrides afterward.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if `yaml` cannot be parsed.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}
