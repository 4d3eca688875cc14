//! The evolving population: per-agent records plus the bookkeeping the
//! Kiln needs across generations.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use kiln_graph::TopologyOverlay;
use kiln_mercy::ActionRecord;
use kiln_types::{Agent, AgentId, CoherenceReport};

/// One agent's overlay plus the bookkeeping the Kiln needs across
/// generations.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// The agent's identity and lifecycle metadata.
    pub agent: Agent,
    /// This agent's private topology overlay.
    pub overlay: TopologyOverlay,
    /// The most recent coherence report, if this agent has been evaluated
    /// at least once.
    pub last_report: Option<CoherenceReport>,
    /// Consecutive generations since this agent's verdict was last
    /// `Coherent`, `Growing`, or growing by its own `growth_delta`.
    pub generations_since_growth: u32,
    /// Cumulative activation-spread steps run across this agent's
    /// lifetime, used to gate the perturbation/healing maintenance
    /// cadence (`DynamicsConfig::perturb_interval`/`heal_interval`).
    pub lifetime_steps: u64,
    /// Recent harm-relevant action records, pruned to the warning-decay
    /// window, used by [`kiln_mercy::classify`]'s repeat-violation rule.
    pub action_history: VecDeque<ActionRecord>,
    /// Failure kinds this agent has already received a `Teach` lesson
    /// for, so a repeat gets `Warn` instead.
    pub taught_failure_kinds: BTreeSet<String>,
}

impl AgentRecord {
    /// Construct a fresh record for a newly spawned or newly bred agent.
    pub fn new(agent: Agent, overlay: TopologyOverlay) -> Self {
        Self {
            agent,
            overlay,
            last_report: None,
            generations_since_growth: 0,
            lifetime_steps: 0,
            action_history: VecDeque::new(),
            taught_failure_kinds: BTreeSet::new(),
        }
    }
}

/// The full evolving population, plus the current generation counter.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// The current generation number, incremented at the end of
    /// [`crate::generation::one_generation`].
    pub generation: u32,
    /// Every agent currently alive, keyed by id.
    pub records: BTreeMap<AgentId, AgentRecord>,
}

impl Population {
    /// Create an empty population at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: AgentRecord) {
        self.records.insert(record.agent.id, record);
    }

    /// Number of agents currently alive.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the population currently holds no agents.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
