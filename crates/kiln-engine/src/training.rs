//! Per-agent training-and-evaluation: a deterministic Hebbian learning
//! pass over freshly sampled stimuli, maintenance (decay/perturbation/
//! healing), and read-only coherence scoring.
//!
//! [`kiln_coherence::evaluate`] never mutates the overlay it scores (it
//! only samples stimuli and runs trajectories to tally captures), so
//! learning has to happen in a separate pass run by the Kiln itself: this
//! module samples its own training stimuli, runs them through
//! [`kiln_dynamics::run_trajectory`], and applies
//! [`kiln_dynamics::hebbian::apply`] before handing the (now-updated)
//! overlay to `evaluate` for scoring.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kiln_gestalt::GestaltConfig;
use kiln_graph::{GraphSubstrate, VirtueRegistry};
use kiln_types::{AgentId, AgentStatus, CoherenceReport, Gestalt, NodeId, Trajectory, VirtueId};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::generation::Evaluator;
use crate::population::{AgentRecord, Population};

/// The per-agent result of one generation's training-and-evaluation pass.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The coherence report produced by the read-only scoring pass.
    pub report: CoherenceReport,
    /// The Gestalt computed from this generation's activation snapshot.
    pub gestalt: Gestalt,
    /// Pathway capture events observed during training: the stimulus
    /// node, the anchor it was captured by, and the trajectory taken.
    pub captures: Vec<(NodeId, VirtueId, Trajectory)>,
}

/// Run the training-and-evaluation phase over every active agent in
/// `population`, using `evaluator` to choose between a sequential pass
/// and a `std::thread::scope`-based fan-out.
///
/// # Errors
///
/// Propagates the first [`EngineError`] raised while training or scoring
/// any agent.
pub fn evaluate_population(
    engine: &Engine,
    population: &mut Population,
    now: DateTime<Utc>,
    evaluator: Evaluator,
) -> Result<Vec<(AgentId, TrainingOutcome)>, EngineError> {
    let targets: Vec<(AgentId, &mut AgentRecord)> = population
        .records
        .iter_mut()
        .filter(|(_, record)| matches!(record.agent.status, AgentStatus::Evolving | AgentStatus::Bound))
        .map(|(&id, record)| (id, record))
        .collect();

    match evaluator {
        Evaluator::Sequential => evaluate_sequential(engine, targets, now),
        Evaluator::Parallel => evaluate_parallel(engine, targets, now),
    }
}

fn evaluate_sequential(engine: &Engine, mut targets: Vec<(AgentId, &mut AgentRecord)>, now: DateTime<Utc>) -> Result<Vec<(AgentId, TrainingOutcome)>, EngineError> {
    let mut out = Vec::with_capacity(targets.len());
    for (id, record) in &mut targets {
        let outcome = train_and_evaluate_agent(engine, now, record)?;
        out.push((*id, outcome));
    }
    Ok(out)
}

/// Fan out across a bounded pool of scoped threads: each thread owns a
/// disjoint slice of `&mut AgentRecord` (split from the population's own
/// iterator, so no two threads ever touch the same overlay) and an
/// immutable, `Sync` view of the substrate/registry/config. No
/// `Arc<Mutex<_>>` needed -- `std::thread::scope` lets the borrows outlive
/// the spawned threads because the scope blocks until they finish.
fn evaluate_parallel(engine: &Engine, mut targets: Vec<(AgentId, &mut AgentRecord)>, now: DateTime<Utc>) -> Result<Vec<(AgentId, TrainingOutcome)>, EngineError> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }
    let worker_count = std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(4).min(targets.len());
    let chunk_size = targets.len().div_ceil(worker_count.max(1)).max(1);

    let chunked: Result<Vec<Vec<(AgentId, TrainingOutcome)>>, EngineError> = std::thread::scope(|scope| {
        let handles: Vec<_> = targets
            .chunks_mut(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut out = Vec::with_capacity(chunk.len());
                    for (id, record) in chunk.iter_mut() {
                        let outcome = train_and_evaluate_agent(engine, now, record)?;
                        out.push((*id, outcome));
                    }
                    Ok::<_, EngineError>(out)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap_or_else(|_| Err(EngineError::ThreadPanicked))).collect()
    });

    Ok(chunked?.into_iter().flatten().collect())
}

#[allow(clippy::arithmetic_side_effects)]
fn train_and_evaluate_agent(engine: &Engine, now: DateTime<Utc>, record: &mut AgentRecord) -> Result<TrainingOutcome, EngineError> {
    let substrate = &engine.substrate;
    let registry = &engine.registry;
    let dynamics_config = &engine.config.dynamics;
    let coherence_config = &engine.config.coherence;
    let kiln_config = &engine.config.kiln;
    let gestalt_config = &engine.gestalt_config;

    let stimuli = sample_training_stimuli(substrate, &record.overlay, record.agent.id, record.agent.generation, kiln_config.n_training_stimuli);

    let mut activation_sums: BTreeMap<VirtueId, (f64, u32)> = BTreeMap::new();
    let mut captures = Vec::new();
    let steps_before = record.lifetime_steps;

    for stimulus in stimuli {
        let outcome = kiln_dynamics::run_trajectory(substrate, &record.overlay, registry, dynamics_config, record.agent.id, record.agent.archetype, record.agent.generation, stimulus)?;
        let captured = outcome.trajectory.captured_by.is_some();
        kiln_dynamics::hebbian::apply(&mut record.overlay, dynamics_config, &outcome.trajectory.path, &outcome.dwell_history, captured, now);
        record.lifetime_steps = record.lifetime_steps.saturating_add(u64::from(outcome.trajectory.length));

        if let Some(anchor) = outcome.trajectory.captured_by {
            let value = outcome.dwell_history.get(&NodeId::Anchor(anchor)).and_then(|samples| samples.last()).copied().unwrap_or(1.0);
            let entry = activation_sums.entry(anchor).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 = entry.1.saturating_add(1);
            captures.push((stimulus, anchor, outcome.trajectory.clone()));
        }
    }

    run_maintenance_if_due(substrate, &mut record.overlay, dynamics_config, now, steps_before, record.lifetime_steps)?;

    let report = kiln_coherence::evaluate(substrate, &record.overlay, registry, dynamics_config, coherence_config, &record.agent, record.last_report.as_ref())?;

    let activations: BTreeMap<VirtueId, f64> = activation_sums.into_iter().map(|(virtue, (sum, count))| (virtue, mean(sum, count))).collect();

    let gestalt = kiln_gestalt::compute_gestalt(record.agent.id, registry, &record.overlay, &activations, &report.per_virtue_captures, gestalt_config);
    record.agent.archetype = gestalt.archetype;
    record.last_report = Some(report.clone());

    Ok(TrainingOutcome { report, gestalt, captures })
}

#[allow(clippy::cast_precision_loss)]
fn mean(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Sample `n` training stimuli for `agent_id` at `generation`.
///
/// Deterministic per `(agent_id, generation)` pair, unlike
/// [`kiln_coherence::sample_stimuli`] which seeds on `agent_id` alone --
/// training wants a fresh batch every generation while staying
/// reproducible for replay of a specific generation.
fn sample_training_stimuli(substrate: &GraphSubstrate, overlay: &kiln_graph::TopologyOverlay, agent_id: AgentId, generation: u32, n: u32) -> Vec<NodeId> {
    let eligible: Vec<NodeId> = substrate.concept_ids().map(NodeId::Concept).filter(|&node| overlay.has_outgoing(node)).collect();
    if eligible.is_empty() {
        return Vec::new();
    }
    let mut rng = seeded_rng(agent_id, generation);
    (0..n).filter_map(|_| eligible.choose(&mut rng).copied()).collect()
}

/// Seeded like [`kiln_coherence::sample_stimuli`]'s own `seed_for`, but
/// also folding in the generation number so training draws a fresh batch
/// every generation instead of the same one forever.
fn seeded_rng(agent_id: AgentId, generation: u32) -> StdRng {
    let (hi, lo) = agent_id.into_inner().as_u64_pair();
    StdRng::seed_from_u64(hi ^ lo ^ u64::from(generation))
}

fn run_maintenance_if_due(
    substrate: &GraphSubstrate,
    overlay: &mut kiln_graph::TopologyOverlay,
    dynamics_config: &kiln_dynamics::DynamicsConfig,
    now: DateTime<Utc>,
    steps_before: u64,
    steps_after: u64,
) -> Result<(), EngineError> {
    kiln_dynamics::decay::apply(overlay, substrate, dynamics_config, now, chrono::Duration::seconds(1))?;

    if crossed_multiple(steps_before, steps_after, u64::from(dynamics_config.perturb_interval)) {
        let mut rng = StdRng::seed_from_u64(steps_after ^ 0xA5A5_A5A5_A5A5_A5A5);
        kiln_dynamics::perturb::apply(overlay, dynamics_config, &mut rng);
    }
    if crossed_multiple(steps_before, steps_after, u64::from(dynamics_config.heal_interval)) {
        let mut rng = StdRng::seed_from_u64(steps_after ^ 0x5A5A_5A5A_5A5A_5A5A);
        kiln_dynamics::heal::apply(substrate, overlay, dynamics_config, &mut rng)?;
    }
    Ok(())
}

const fn crossed_multiple(before: u64, after: u64, interval: u64) -> bool {
    interval > 0 && before / interval != after / interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossed_multiple_detects_boundary_crossing() {
        assert!(crossed_multiple(9, 11, 10));
        assert!(!crossed_multiple(11, 15, 10));
        assert!(!crossed_multiple(5, 5, 10));
        assert!(!crossed_multiple(5, 9, 0));
    }

    #[test]
    fn mean_of_zero_samples_is_zero() {
        assert_eq!(mean(0.0, 0), 0.0);
    }
}
