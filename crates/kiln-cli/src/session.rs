//! Local session persistence: a JSON snapshot file that bridges
//! `Engine`/`Population` state across the separate process invocations
//! `spawn`, `test`, `spread`, `dissolve`, and `warnings` are run as.
//!
//! The engine's live state (graph substrate, overlays, warning ladders)
//! has no natural row shape and the external `kiln-store` adapter's
//! `query` verb returns untyped string columns rather than structured
//! rows a session can rebuild itself from (see `DESIGN.md`), so this
//! upserts a single local file on restart instead. `kiln-store` remains
//! the durable write path to an external store; this file is what the
//! CLI itself reads back between invocations.

use std::path::Path;

use kiln_engine::{Engine, SimulationConfig};
use kiln_engine::population::{AgentRecord, Population};
use kiln_graph::{GraphSubstrate, TopologyOverlay, VirtueDefinition, VirtueRegistry};
use kiln_types::{Agent, AgentId, CoherenceReport, Concept, Lesson, Pathway, Warning};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// One agent's persisted fields. `action_history` and
/// `taught_failure_kinds` are not persisted: they bound the
/// repeat-violation window within one continuous `kiln` run and are
/// reset (to an empty window) on every fresh session load, exactly as
/// they would be for a newly spawned agent (see `DESIGN.md`).
#[derive(Debug, Serialize, Deserialize)]
struct AgentSnapshot {
    agent: Agent,
    overlay: TopologyOverlay,
    last_report: Option<CoherenceReport>,
    generations_since_growth: u32,
    lifetime_steps: u64,
}

/// One agent's persisted Mercy ladder state.
#[derive(Debug, Serialize, Deserialize)]
struct MercySnapshot {
    agent_id: AgentId,
    warnings: Vec<Warning>,
    dissolved: bool,
    grace_remaining: Option<u32>,
}

/// The full on-disk session document.
#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    seed: Vec<VirtueDefinition>,
    concepts: Vec<Concept>,
    generation: u32,
    agents: Vec<AgentSnapshot>,
    lessons: Vec<Lesson>,
    pathways: Vec<Pathway>,
    mercy: Vec<MercySnapshot>,
}

/// Live, in-memory session state: the orchestration context plus the
/// evolving population it acts on.
pub struct Session {
    pub engine: Engine,
    pub population: Population,
}

impl Session {
    /// Build a freshly initialized session from `seed` and `config`, with
    /// no concepts or agents yet.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Graph`] if `seed` does not describe exactly 19
    /// anchors with exactly one Foundation virtue.
    pub fn fresh(seed: Vec<VirtueDefinition>, config: SimulationConfig) -> Result<Self, CliError> {
        let mut substrate = GraphSubstrate::new();
        let mut registry = VirtueRegistry::new();
        registry.initialize(&mut substrate, seed)?;
        Ok(Self {
            engine: Engine::new(substrate, registry, config),
            population: Population::new(),
        })
    }

    /// Load a session from `path`, re-seeding the registry from the
    /// document's own recorded virtue definitions so `VirtueAnchor`
    /// identity is stable across reloads (invariant P1).
    ///
    /// Returns `Ok(None)` if no session file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::SessionIo`]/[`CliError::SessionFormat`] if the
    /// file exists but cannot be read or parsed, or [`CliError::Graph`] if
    /// the recorded seed no longer describes a valid anchor set.
    pub fn load(path: &Path, config: SimulationConfig) -> Result<Option<Self>, CliError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let document: SessionDocument = serde_json::from_str(&raw)?;

        let mut substrate = GraphSubstrate::new();
        let mut registry = VirtueRegistry::new();
        registry.initialize(&mut substrate, document.seed)?;
        for concept in document.concepts {
            substrate.restore_concept(concept);
        }

        let mut engine = Engine::new(substrate, registry, config);
        for lesson in document.lessons {
            engine.knowledge.record_lesson(lesson);
        }
        for pathway in document.pathways {
            engine.knowledge.record_pathway(pathway);
        }
        for entry in document.mercy {
            engine.mercy.restore_record(entry.agent_id, entry.warnings, entry.dissolved, entry.grace_remaining);
        }

        let mut population = Population::new();
        population.generation = document.generation;
        for snapshot in document.agents {
            let mut record = AgentRecord::new(snapshot.agent, snapshot.overlay);
            record.last_report = snapshot.last_report;
            record.generations_since_growth = snapshot.generations_since_growth;
            record.lifetime_steps = snapshot.lifetime_steps;
            population.insert(record);
        }

        Ok(Some(Self { engine, population }))
    }

    /// Write this session's state to `path`, overwriting any prior
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::SessionIo`] if `path` cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let seed: Vec<VirtueDefinition> = self
            .engine
            .registry
            .list_virtues()
            .map(|anchor| VirtueDefinition {
                id: anchor.id,
                name: anchor.name.clone(),
                tier: anchor.tier,
                cluster: anchor.cluster,
                base_threshold: anchor.base_threshold,
                baseline_activation: anchor.baseline_activation,
            })
            .collect();
        let concepts: Vec<Concept> = self.engine.substrate.concepts().cloned().collect();
        let agents: Vec<AgentSnapshot> = self
            .population
            .records
            .values()
            .map(|record| AgentSnapshot {
                agent: record.agent.clone(),
                overlay: record.overlay.clone_overlay(),
                last_report: record.last_report.clone(),
                generations_since_growth: record.generations_since_growth,
                lifetime_steps: record.lifetime_steps,
            })
            .collect();
        let mercy: Vec<MercySnapshot> = self
            .engine
            .mercy
            .all_records()
            .map(|record| MercySnapshot {
                agent_id: record.agent_id(),
                warnings: record.active_warnings().to_vec(),
                dissolved: record.is_dissolved(),
                grace_remaining: record.grace_remaining(),
            })
            .collect();

        let document = SessionDocument {
            seed,
            concepts,
            generation: self.population.generation,
            agents,
            lessons: self.engine.knowledge.all_lessons(),
            pathways: self.engine.knowledge.all_pathways(),
            mercy,
        };
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Count of every anchor, concept, agent, and active warning currently
    /// held, for `status`.
    pub fn counts(&self) -> SessionCounts {
        let active_warnings: usize = self.engine.mercy.all_records().map(|record| record.active_warnings().len()).sum();
        SessionCounts {
            anchors: self.engine.substrate.anchor_count(),
            concepts: self.engine.substrate.concept_count(),
            agents: self.population.len(),
            active_warnings,
        }
    }
}

/// Summary counts reported by `status`.
#[derive(Debug, Serialize)]
pub struct SessionCounts {
    pub anchors: usize,
    pub concepts: usize,
    pub agents: usize,
    pub active_warnings: usize,
}
