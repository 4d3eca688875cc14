//! The one-generation Kiln algorithm (§4.7): expire, evaluate, judge,
//! partition, dissolve, select, vary, increment.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use kiln_mercy::{classify, ActionOutcome, ActionRecord};
use kiln_types::{
    Agent, AgentId, AgentStatus, Archetype, CoherenceVerdict, GenerationReport, HarmRecommendation, Lesson, LessonId,
    LessonKind, MercyState, NodeId, Pathway, PathwayId, Trajectory, TrajectoryId, VirtueId, Warning, WarningId,
    WarningSeverity,
};
use rand::Rng;

use crate::config::KilnConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::population::{AgentRecord, Population};
use crate::selection::select_parents;
use crate::training::{evaluate_population, TrainingOutcome};
use crate::variation::{crossover, mutate};

/// Which execution strategy the training-and-evaluation phase uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Evaluator {
    /// Evaluate every agent on the calling thread, one after another.
    #[default]
    Sequential,
    /// Fan out across a `std::thread::scope`-based worker pool.
    Parallel,
}

/// Run exactly one Kiln generation.
///
/// # Errors
///
/// Propagates the first [`EngineError`] raised while training, scoring,
/// or varying any agent.
pub fn one_generation(
    engine: &mut Engine,
    population: &mut Population,
    now: DateTime<Utc>,
    evaluator: Evaluator,
    rng: &mut impl Rng,
) -> Result<GenerationReport, EngineError> {
    expire_and_tick_grace(engine, population, now)?;
    let mut dissolved_ids: Vec<AgentId> = grace_expired_ids(engine, population, now);

    let outcomes = evaluate_population(engine, population, now, evaluator)?;

    let mut harm_dissolved: BTreeSet<AgentId> = BTreeSet::new();
    for (id, outcome) in &outcomes {
        judge_outcome(engine, population, *id, outcome, now, &mut harm_dissolved)?;
    }
    for (_, outcome) in &outcomes {
        for (start, anchor, trajectory) in &outcome.captures {
            record_pathway_capture(engine, *start, *anchor, trajectory);
        }
    }

    let (survivors, watched, mut dissolution_candidates) = partition(engine, population, &outcomes, &harm_dissolved);

    let elites = top_elites(population, &survivors, &watched, engine.config.kiln.elites);
    dissolution_candidates.retain(|id| !elites.contains(id));
    let dissolution_candidates: Vec<AgentId> = dissolution_candidates.into_iter().collect::<BTreeSet<_>>().into_iter().collect();

    for id in &dissolution_candidates {
        dissolve_and_remove(engine, population, *id);
    }
    dissolved_ids.extend(dissolution_candidates);

    let candidates = selection_candidates(population, &survivors, &watched);
    let new_ids = breed_offspring(engine, population, &candidates, dissolved_ids.len(), rng)?;

    build_report(population, &outcomes, dissolved_ids, new_ids)
}

fn expire_and_tick_grace(engine: &mut Engine, population: &Population, now: DateTime<Utc>) -> Result<(), EngineError> {
    let agent_ids: Vec<AgentId> = population.records.keys().copied().collect();
    for id in agent_ids {
        if let Err(err) = engine.mercy.expire_warnings(id, now) {
            if !matches!(err, kiln_mercy::MercyError::UnknownAgent { .. }) {
                return Err(err.into());
            }
        }
    }
    Ok(())
}

fn grace_expired_ids(engine: &mut Engine, population: &mut Population, _now: DateTime<Utc>) -> Vec<AgentId> {
    let expired = engine.mercy.tick_grace_periods();
    for &id in &expired {
        dissolve_and_remove(engine, population, id);
    }
    expired
}

#[allow(clippy::too_many_arguments)]
fn judge_outcome(
    engine: &mut Engine,
    population: &mut Population,
    id: AgentId,
    outcome: &TrainingOutcome,
    now: DateTime<Utc>,
    harm_dissolved: &mut BTreeSet<AgentId>,
) -> Result<(), EngineError> {
    let growth_threshold = engine.config.coherence.growth_threshold;
    let growing = outcome.report.growth_delta.is_some_and(|delta| delta >= growth_threshold);
    let verdict = outcome.report.verdict;

    if matches!(verdict, CoherenceVerdict::Coherent | CoherenceVerdict::Growing) {
        engine.mercy.clear_for_growth(id);
    }

    let Some(record) = population.records.get_mut(&id) else { return Ok(()) };
    if matches!(verdict, CoherenceVerdict::Struggling | CoherenceVerdict::FoundationFailed) && !growing {
        record.generations_since_growth = record.generations_since_growth.saturating_add(1);
    } else {
        record.generations_since_growth = 0;
    }

    let Some(failure) = failure_outcome(verdict) else { return Ok(()) };
    let failure_kind = failure_kind_name(&failure);

    prune_action_history(record, now, engine.config.mercy.warning_decay());
    let current = ActionRecord { trajectory: marker_trajectory(id), outcome: failure, recorded_at: now };
    let history: Vec<ActionRecord> = record.action_history.iter().cloned().collect();

    // High-severity verdicts bypass the warning ladder entirely --
    // `MercyMachine::issue_warning` refuses to store one -- so no agent
    // can ever carry a stored High warning on the Foundation virtue to
    // check against. The repeat-violation rule is the only escalation
    // path available here.
    let verdict_h = classify(&engine.config.mercy, false, &history, &record.taught_failure_kinds, &current);

    match verdict_h.recommendation {
        HarmRecommendation::Teach => {
            record.taught_failure_kinds.insert(failure_kind);
            engine.knowledge.record_lesson(Lesson {
                id: LessonId::new(),
                kind: LessonKind::Failure,
                source_agent_id: id,
                virtue_id: None,
                description: verdict_h.reasons.join("; "),
                created_at: now,
                access_count: 0,
            });
        }
        HarmRecommendation::Warn => {
            engine.mercy.issue_warning(
                id,
                Warning {
                    id: WarningId::new(),
                    agent_id: id,
                    virtue_id: None,
                    severity: WarningSeverity::Low,
                    reason: verdict_h.reasons.join("; "),
                    issued_at: now,
                    expires_at: now + engine.config.mercy.warning_decay(),
                },
            );
        }
        HarmRecommendation::Dissolve => {
            engine.mercy.dissolve(id);
            harm_dissolved.insert(id);
        }
    }

    record.action_history.push_back(current);
    Ok(())
}

/// Bridge a [`CoherenceVerdict`] into the harm-classification vocabulary.
/// There is no separate "outcome resolver" component in this system, so
/// the generation loop fills that role: a `FoundationFailed` verdict is
/// treated as a Foundation-virtue violation, a `Struggling` verdict as an
/// aspirational failure. `Coherent`/`Growing` never reach classification.
fn failure_outcome(verdict: CoherenceVerdict) -> Option<ActionOutcome> {
    match verdict {
        CoherenceVerdict::FoundationFailed => Some(ActionOutcome::FoundationViolation { pattern: "foundation-capture-below-threshold".to_owned() }),
        CoherenceVerdict::Struggling => Some(ActionOutcome::AspirationalFailure { failure_kind: "aspirational-coherence-stall".to_owned() }),
        CoherenceVerdict::Coherent | CoherenceVerdict::Growing => None,
    }
}

fn failure_kind_name(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::FoundationViolation { pattern } => pattern.clone(),
        ActionOutcome::AspirationalFailure { failure_kind } | ActionOutcome::KnowledgePoison { failure_kind } => failure_kind.clone(),
    }
}

fn marker_trajectory(agent_id: AgentId) -> Trajectory {
    Trajectory {
        id: TrajectoryId::new(),
        agent_id,
        stimulus_id: NodeId::Anchor(VirtueId::FOUNDATION),
        path: Vec::new(),
        captured_by: None,
        capture_step: None,
        length: 0,
    }
}

fn prune_action_history(record: &mut AgentRecord, now: DateTime<Utc>, window: chrono::Duration) {
    while let Some(front) = record.action_history.front() {
        if now - front.recorded_at > window {
            record.action_history.pop_front();
        } else {
            break;
        }
    }
}

fn record_pathway_capture(engine: &mut Engine, start: NodeId, anchor: VirtueId, trajectory: &Trajectory) {
    if let Some(&pathway_id) = engine.pathway_index.get(&(start, anchor)) {
        engine.knowledge.bump_pathway_use(pathway_id, true);
        return;
    }
    let pathway = Pathway {
        id: PathwayId::new(),
        start_node_id: start,
        anchor_id: anchor,
        path: trajectory.path.clone(),
        length: trajectory.length,
        mean_capture_step: trajectory.capture_step.map_or(0.0, f64::from),
        success_rate: 1.0,
        uses: 1,
    };
    engine.pathway_index.insert((start, anchor), pathway.id);
    engine.knowledge.record_pathway(pathway);
}

fn partition(
    engine: &Engine,
    population: &Population,
    outcomes: &[(AgentId, TrainingOutcome)],
    harm_dissolved: &BTreeSet<AgentId>,
) -> (Vec<AgentId>, Vec<AgentId>, Vec<AgentId>) {
    let grace_period = engine.config.kiln.grace_period;
    let mut survivors = Vec::new();
    let mut watched = Vec::new();
    let mut dissolution_candidates: Vec<AgentId> = harm_dissolved.iter().copied().collect();

    for (id, outcome) in outcomes {
        if harm_dissolved.contains(id) {
            continue;
        }
        let Some(record) = population.records.get(id) else { continue };
        let pending_dissolution = matches!(engine.mercy.state(*id), MercyState::Dissolution);
        match outcome.report.verdict {
            CoherenceVerdict::Coherent | CoherenceVerdict::Growing => survivors.push(*id),
            CoherenceVerdict::FoundationFailed | CoherenceVerdict::Struggling => {
                if pending_dissolution || record.generations_since_growth >= grace_period {
                    dissolution_candidates.push(*id);
                } else {
                    watched.push(*id);
                }
            }
        }
    }
    (survivors, watched, dissolution_candidates)
}

fn top_elites(population: &Population, survivors: &[AgentId], watched: &[AgentId], elites: usize) -> BTreeSet<AgentId> {
    let mut pool: Vec<(AgentId, f64)> = survivors
        .iter()
        .chain(watched.iter())
        .filter_map(|id| population.records.get(id).map(|record| (*id, fitness_of(record))))
        .collect();
    pool.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    pool.into_iter().take(elites).map(|(id, _)| id).collect()
}

fn fitness_of(record: &AgentRecord) -> f64 {
    record.last_report.as_ref().map_or(0.0, kiln_types::CoherenceReport::overall_rate)
}

fn dissolve_and_remove(engine: &mut Engine, population: &mut Population, id: AgentId) {
    engine.mercy.dissolve(id);
    engine.mercy.forget(id);
    population.records.remove(&id);
}

fn selection_candidates(population: &Population, survivors: &[AgentId], watched: &[AgentId]) -> Vec<(AgentId, f64)> {
    survivors
        .iter()
        .chain(watched.iter())
        .filter_map(|id| {
            let record = population.records.get(id)?;
            if record.agent.binding.is_some() {
                return None;
            }
            Some((*id, fitness_of(record)))
        })
        .collect()
}

fn breed_offspring(
    engine: &Engine,
    population: &mut Population,
    candidates: &[(AgentId, f64)],
    n_offspring: usize,
    rng: &mut impl Rng,
) -> Result<Vec<AgentId>, EngineError> {
    let mut new_ids = Vec::with_capacity(n_offspring);
    if candidates.is_empty() {
        return Ok(new_ids);
    }
    let kiln_config = engine.config.kiln.clone();
    for _ in 0..n_offspring {
        let parents = select_parents(candidates, 2, kiln_config.selection, rng);
        let Some(&parent_a) = parents.first() else { continue };
        let parent_b = parents.get(1).copied().unwrap_or(parent_a);
        if let Some(record) = breed(engine, population, parent_a, parent_b, &kiln_config, rng)? {
            new_ids.push(record.agent.id);
            population.insert(record);
        }
    }
    Ok(new_ids)
}

fn breed(
    engine: &Engine,
    population: &Population,
    parent_a: AgentId,
    parent_b: AgentId,
    kiln_config: &KilnConfig,
    rng: &mut impl Rng,
) -> Result<Option<AgentRecord>, EngineError> {
    let Some(a) = population.records.get(&parent_a) else { return Ok(None) };
    let Some(b) = population.records.get(&parent_b) else { return Ok(None) };

    let mut overlay = if rng.random_bool(kiln_config.crossover_rate) {
        crossover(&a.overlay, &b.overlay, rng)?
    } else {
        a.overlay.clone_overlay()
    };
    mutate(&engine.substrate, &mut overlay, kiln_config, rng)?;

    let agent = Agent {
        id: AgentId::new(),
        archetype: Archetype::Untyped,
        generation: population.generation.saturating_add(1),
        parent_ids: vec![parent_a, parent_b],
        binding: None,
        status: AgentStatus::Evolving,
    };
    Ok(Some(AgentRecord::new(agent, overlay)))
}

#[allow(clippy::cast_precision_loss)]
fn build_report(
    population: &mut Population,
    outcomes: &[(AgentId, TrainingOutcome)],
    dissolved_ids: Vec<AgentId>,
    new_ids: Vec<AgentId>,
) -> Result<GenerationReport, EngineError> {
    let population_size = outcomes.len();
    let rates: Vec<f64> = outcomes.iter().map(|(_, outcome)| outcome.report.overall_rate()).collect();
    let mean_fitness = if rates.is_empty() { 0.0 } else { rates.iter().sum::<f64>() / rates.len() as f64 };
    let best_fitness = rates.iter().copied().fold(0.0_f64, f64::max);
    let coherent_count = outcomes.iter().filter(|(_, outcome)| outcome.report.verdict == CoherenceVerdict::Coherent).count();
    let coherent_fraction = if population_size == 0 { 0.0 } else { coherent_count as f64 / population_size as f64 };

    population.generation = population.generation.saturating_add(1);

    Ok(GenerationReport {
        generation: population.generation,
        population_size,
        mean_fitness,
        best_fitness,
        dissolved_ids,
        new_ids,
        coherent_fraction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_outcome_is_none_for_healthy_verdicts() {
        assert!(failure_outcome(CoherenceVerdict::Coherent).is_none());
        assert!(failure_outcome(CoherenceVerdict::Growing).is_none());
    }

    #[test]
    fn failure_outcome_maps_struggling_and_foundation_failed() {
        assert!(matches!(failure_outcome(CoherenceVerdict::Struggling), Some(ActionOutcome::AspirationalFailure { .. })));
        assert!(matches!(failure_outcome(CoherenceVerdict::FoundationFailed), Some(ActionOutcome::FoundationViolation { .. })));
    }
}
