//! The `Engine` orchestration context (§9 Design Notes: explicit context
//! threaded through calls instead of ambient singletons).

use std::collections::BTreeMap;

use kiln_gestalt::GestaltConfig;
use kiln_graph::{GraphSubstrate, VirtueRegistry};
use kiln_knowledge::KnowledgePool;
use kiln_mercy::MercyMachine;
use kiln_types::{GenerationReport, NodeId, PathwayId, VirtueId};
use rand::Rng;

use crate::config::SimulationConfig;
use crate::error::EngineError;
use crate::generation::{one_generation, Evaluator};
use crate::population::Population;

/// Every piece of shared state a Kiln generation needs, threaded
/// explicitly rather than held in globals.
#[derive(Debug)]
pub struct Engine {
    /// The shared node store: anchors plus every agent's concepts.
    pub substrate: GraphSubstrate,
    /// The immutable virtue registry.
    pub registry: VirtueRegistry,
    /// The shared knowledge pool (Lessons and Pathways outlive any one
    /// agent).
    pub knowledge: KnowledgePool,
    /// The warning lifecycle state machine.
    pub mercy: MercyMachine,
    /// Tendency and archetype configuration for the Gestalt Analyzer,
    /// derived once from `registry`.
    pub gestalt_config: GestaltConfig,
    /// Every tunable constant: dynamics, coherence, mercy, and the Kiln.
    pub config: SimulationConfig,
    /// Local index from `(start node, captured anchor)` to the pathway
    /// recorded for it, since [`KnowledgePool`] itself is keyed by a
    /// pathway's own id rather than by this pair.
    pub pathway_index: BTreeMap<(NodeId, VirtueId), PathwayId>,
}

impl Engine {
    /// Build an engine context from an initialized substrate/registry and
    /// a configuration document.
    pub fn new(substrate: GraphSubstrate, registry: VirtueRegistry, config: SimulationConfig) -> Self {
        let gestalt_config = GestaltConfig::from_registry(&registry);
        Self {
            substrate,
            registry,
            knowledge: KnowledgePool::new(),
            mercy: MercyMachine::new(config.mercy.clone()),
            gestalt_config,
            config,
            pathway_index: BTreeMap::new(),
        }
    }

    /// Run the Kiln loop until `max_generations` or `target_fraction` is
    /// reached, using `evaluator` to dispatch the per-agent training and
    /// evaluation phase.
    ///
    /// # Errors
    ///
    /// Propagates the first [`EngineError`] raised by any phase.
    pub fn run(&mut self, population: &mut Population, evaluator: Evaluator, now: chrono::DateTime<chrono::Utc>, rng: &mut impl Rng) -> Result<Vec<GenerationReport>, EngineError> {
        let mut reports = Vec::new();
        loop {
            let report = one_generation(self, population, now, evaluator, rng)?;
            let target_reached = report.coherent_fraction >= self.config.kiln.target_fraction;
            let max_reached = report.generation >= self.config.kiln.max_generations;
            reports.push(report);
            if target_reached || max_reached {
                break;
            }
        }
        Ok(reports)
    }
}
