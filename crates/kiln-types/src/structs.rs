//! Core entity structs shared across the Soul Kiln workspace.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{
    Archetype, CoherenceVerdict, HarmIntent, HarmRecommendation, LessonKind, MercyState, Tier,
    WarningSeverity,
};
use crate::ids::{AgentId, LessonId, NodeId, PathwayId, TrajectoryId, VirtueId, WarningId};

/// A fixed virtue anchor. Created once at `init`; immutable thereafter
/// (invariant P1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtueAnchor {
    /// The anchor's stable ordinal identifier (`V01`..`V19`).
    pub id: VirtueId,
    /// Human-readable name (e.g. "Courage").
    pub name: String,
    /// Foundation or Aspirational.
    pub tier: Tier,
    /// The cluster this anchor contributes to for archetype derivation.
    pub cluster: Archetype,
    /// The un-modulated base threshold used as the starting point for
    /// [`crate::structs::VirtueAnchor`] threshold derivation (Aspirational
    /// virtues only; Foundation ignores this and uses the constant 0.99).
    pub base_threshold: f64,
    /// Starting activation for this anchor at the beginning of a
    /// trajectory, before any spread has occurred. Defaults to `0.3`.
    pub baseline_activation: f64,
}

/// A mutable concept node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// The concept's identifier.
    pub id: crate::ids::ConceptId,
    /// Human-readable name.
    pub name: String,
    /// Starting activation before any spread has occurred. Defaults to
    /// `0.1`.
    pub baseline_activation: f64,
}

/// A candidate agent: a topology of weighted edges over the shared node
/// set, subject to evolutionary selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// The agent's identifier.
    pub id: AgentId,
    /// Derived behavioral archetype, or `Untyped` before the first
    /// Gestalt computation.
    pub archetype: Archetype,
    /// The generation this agent was produced in.
    pub generation: u32,
    /// Parent agent ids, empty for an initial-population agent.
    pub parent_ids: Vec<AgentId>,
    /// An optional external identity this agent is bound to.
    pub binding: Option<String>,
    /// Lifecycle status.
    pub status: crate::enums::AgentStatus,
}

/// A single weighted, directed edge in a [`crate::ids::AgentId`]'s topology
/// overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Edge weight, confined to `[0, 1]` (invariant I4).
    pub weight: f64,
    /// Number of times this edge has been traversed by a captured
    /// trajectory.
    pub use_count: u64,
    /// Wall-clock time this edge was last traversed, if ever.
    pub last_used: Option<DateTime<Utc>>,
}

impl Edge {
    /// Construct a fresh edge with the given weight and no usage history.
    pub const fn new(weight: f64) -> Self {
        Self {
            weight,
            use_count: 0,
            last_used: None,
        }
    }
}

/// The ordered node sequence and capture outcome produced by one stimulus
/// on one overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// The trajectory's identifier.
    pub id: TrajectoryId,
    /// The agent this trajectory was run against.
    pub agent_id: AgentId,
    /// The node the trajectory was stimulated from.
    pub stimulus_id: NodeId,
    /// The canonical path recorded during the run (distinct nodes in order
    /// of first crossing the recording threshold, terminating at the
    /// captured anchor if any).
    pub path: Vec<NodeId>,
    /// The anchor that captured this trajectory, if any.
    pub captured_by: Option<VirtueId>,
    /// The step at which capture occurred, if any.
    pub capture_step: Option<u32>,
    /// Total number of steps the run executed.
    pub length: u32,
}

impl Trajectory {
    /// Whether this trajectory escaped (ran to `MAX_STEPS` with no capture).
    pub const fn escaped(&self) -> bool {
        self.captured_by.is_none()
    }
}

/// A time-bounded mark placed by the Mercy Machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// The warning's identifier.
    pub id: WarningId,
    /// The agent this warning was issued against.
    pub agent_id: AgentId,
    /// The virtue this warning relates to, if any.
    pub virtue_id: Option<VirtueId>,
    /// How severe the triggering action was judged to be.
    pub severity: WarningSeverity,
    /// Human-readable reason.
    pub reason: String,
    /// When the warning was issued.
    pub issued_at: DateTime<Utc>,
    /// When the warning expires absent growth clearance.
    pub expires_at: DateTime<Utc>,
}

impl Warning {
    /// Whether this warning is still active at the given wall-clock time.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A recorded lesson, persisting beyond the agent that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// The lesson's identifier.
    pub id: LessonId,
    /// The category of lesson.
    pub kind: LessonKind,
    /// The agent this lesson originated from. May outlive the agent.
    pub source_agent_id: AgentId,
    /// The virtue this lesson relates to, if any.
    pub virtue_id: Option<VirtueId>,
    /// Human-readable description.
    pub description: String,
    /// When the lesson was recorded.
    pub created_at: DateTime<Utc>,
    /// Number of times this lesson has been retrieved by a query.
    pub access_count: u64,
}

/// A recorded successful trajectory, usable as prior knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    /// The pathway's identifier.
    pub id: PathwayId,
    /// The node the pathway starts from.
    pub start_node_id: NodeId,
    /// The anchor the pathway captures into.
    pub anchor_id: VirtueId,
    /// The recorded node sequence.
    pub path: Vec<NodeId>,
    /// Path length in nodes.
    pub length: u32,
    /// Mean capture step observed across all uses.
    pub mean_capture_step: f64,
    /// Exponentially weighted moving average of successful reuse,
    /// smoothing factor `0.1`.
    pub success_rate: f64,
    /// Number of times this pathway has been tried.
    pub uses: u64,
}

/// The report produced by one Coherence Evaluator (C4) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceReport {
    /// Capture rate on the Foundation virtue (V01).
    pub foundation_rate: f64,
    /// Mean capture rate across the 18 Aspirational virtues.
    pub aspirational_rate: f64,
    /// Count of distinct anchors captured at least once.
    pub coverage: u32,
    /// The largest single-anchor capture share.
    pub dominance: f64,
    /// Fraction of sampled stimuli whose trajectory escaped.
    pub escape_rate: f64,
    /// Capture counts per anchor.
    pub per_virtue_captures: BTreeMap<VirtueId, u32>,
    /// Mean capture step across all captured trajectories.
    pub mean_capture_step: f64,
    /// `overall_rate - previous_overall_rate`, if a previous report exists.
    pub growth_delta: Option<f64>,
    /// The verdict derived from the fields above.
    pub verdict: CoherenceVerdict,
}

impl CoherenceReport {
    /// Overall capture rate: captured stimuli over total sampled stimuli.
    pub fn overall_rate(&self) -> f64 {
        1.0 - self.escape_rate
    }
}

/// The outcome of harm classification for one action record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmVerdict {
    /// Whether the action reflects imperfection or deliberate harm.
    pub intent: HarmIntent,
    /// Severity of the classified action.
    pub severity: WarningSeverity,
    /// The recommended response. Side-effect-free: the caller applies it.
    pub recommendation: HarmRecommendation,
    /// Human-readable reasons supporting the verdict.
    pub reasons: Vec<String>,
}

/// Summary of one Kiln (C7) generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// The generation number that was just completed.
    pub generation: u32,
    /// Number of agents evaluated this generation.
    pub population_size: usize,
    /// Mean overall capture rate across the population.
    pub mean_fitness: f64,
    /// Best overall capture rate observed this generation.
    pub best_fitness: f64,
    /// Ids dissolved this generation.
    pub dissolved_ids: Vec<AgentId>,
    /// Ids of offspring produced this generation.
    pub new_ids: Vec<AgentId>,
    /// Fraction of the population with verdict `Coherent`.
    pub coherent_fraction: f64,
}

/// A derived character summary computed from graph state and recent
/// trajectories (C8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gestalt {
    /// The agent this gestalt describes.
    pub agent_id: AgentId,
    /// Current per-anchor activation snapshot, ordered by [`VirtueId`].
    pub activations: BTreeMap<VirtueId, f64>,
    /// Normalized per-anchor capture-count signature.
    pub character_signature: BTreeMap<VirtueId, f64>,
    /// The ten behavioral tendency scores, keyed by tendency name.
    pub tendencies: BTreeMap<String, f64>,
    /// The derived archetype.
    pub archetype: Archetype,
    /// The 41-dimensional embedding:
    /// `[activations(19) || tendencies(10) || relation_stats(8) ||
    /// archetype_onehot(4)]`.
    pub embedding: Vec<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trajectory_escaped_iff_no_capture() {
        let t = Trajectory {
            id: TrajectoryId::new(),
            agent_id: AgentId::new(),
            stimulus_id: NodeId::Anchor(VirtueId(1)),
            path: vec![],
            captured_by: None,
            capture_step: None,
            length: 1000,
        };
        assert!(t.escaped());
    }

    #[test]
    fn warning_is_active_before_expiry_only() {
        let now = Utc::now();
        let warning = Warning {
            id: WarningId::new(),
            agent_id: AgentId::new(),
            virtue_id: None,
            severity: WarningSeverity::Low,
            reason: "test".to_owned(),
            issued_at: now,
            expires_at: now + chrono::Duration::hours(24),
        };
        assert!(warning.is_active_at(now));
        assert!(!warning.is_active_at(now + chrono::Duration::hours(25)));
    }

    #[test]
    fn coherence_report_overall_rate_is_one_minus_escape_rate() {
        let report = CoherenceReport {
            foundation_rate: 1.0,
            aspirational_rate: 0.9,
            coverage: 19,
            dominance: 0.1,
            escape_rate: 0.05,
            per_virtue_captures: BTreeMap::new(),
            mean_capture_step: 2.0,
            growth_delta: None,
            verdict: CoherenceVerdict::Coherent,
        };
        assert!((report.overall_rate() - 0.95).abs() < 1e-9);
    }
}
