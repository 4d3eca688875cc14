//! Kiln (C7): the evolutionary outer loop, plus the `Engine`
//! orchestration context (§9 Design Notes) that threads the substrate,
//! registry, knowledge pool, and mercy machine through one generation
//! without any ambient/global state.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod population;
pub mod selection;
pub mod training;
pub mod variation;

pub use config::{ConfigError, InfrastructureConfig, KilnConfig, SimulationConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use generation::{one_generation, Evaluator};
pub use population::{AgentRecord, Population};
pub use selection::{select_parents, Selection};
pub use training::{evaluate_population, TrainingOutcome};
pub use variation::{crossover, mutate};
