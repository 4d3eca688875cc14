//! Two-tier coherence scoring (C4): run a deterministic stimulus sample
//! through the activation engine and summarize capture behavior.

use std::collections::BTreeMap;

use kiln_dynamics::DynamicsConfig;
use kiln_graph::{GraphSubstrate, TopologyOverlay, VirtueRegistry};
use kiln_types::{Agent, CoherenceReport, CoherenceVerdict, VirtueId};

use crate::config::CoherenceConfig;
use crate::error::CoherenceError;
use crate::sampling::sample_stimuli;

/// Run one coherence evaluation for `agent` against its own overlay.
///
/// `previous` is the agent's last `CoherenceReport`, used to compute
/// `growth_delta`; pass `None` for an agent's first evaluation.
///
/// # Errors
///
/// Returns [`CoherenceError::NoEligibleStimuli`] if the overlay has no
/// concept with an outgoing edge, or propagates a
/// [`CoherenceError::Dynamics`] fault from the underlying trajectory
/// runs.
#[allow(clippy::arithmetic_side_effects)]
pub fn evaluate(
    substrate: &GraphSubstrate,
    overlay: &TopologyOverlay,
    registry: &VirtueRegistry,
    dynamics_config: &DynamicsConfig,
    coherence_config: &CoherenceConfig,
    agent: &Agent,
    previous: Option<&CoherenceReport>,
) -> Result<CoherenceReport, CoherenceError> {
    let stimuli = sample_stimuli(substrate, overlay, agent.id, coherence_config.n_stimuli)?;
    let total = stimuli.len();

    let mut per_virtue_captures: BTreeMap<VirtueId, u32> = registry.list_virtues().map(|a| (a.id, 0)).collect();
    let mut escapes: u32 = 0;
    let mut capture_steps: Vec<u32> = Vec::new();

    for stimulus in stimuli {
        let outcome = kiln_dynamics::run_trajectory(substrate, overlay, registry, dynamics_config, agent.id, agent.archetype, agent.generation, stimulus)?;
        match outcome.trajectory.captured_by {
            Some(virtue) => {
                if let Some(count) = per_virtue_captures.get_mut(&virtue) {
                    *count = count.saturating_add(1);
                }
                if let Some(step) = outcome.trajectory.capture_step {
                    capture_steps.push(step);
                }
            }
            None => escapes = escapes.saturating_add(1),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let total_f64 = total.max(1) as f64;

    let foundation_rate = registry
        .list_virtues()
        .find(|a| registry.is_foundation(a.id))
        .and_then(|a| per_virtue_captures.get(&a.id))
        .copied()
        .map_or(0.0, |count| {
            #[allow(clippy::cast_precision_loss)]
            let count_f64 = count as f64;
            count_f64 / total_f64
        });

    let aspirational_rates: Vec<f64> = per_virtue_captures
        .iter()
        .filter(|&(&virtue, _)| !registry.is_foundation(virtue))
        .map(|(_, &count)| {
            #[allow(clippy::cast_precision_loss)]
            let count_f64 = count as f64;
            count_f64 / total_f64
        })
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let aspirational_len_f64 = aspirational_rates.len().max(1) as f64;
    let aspirational_rate = aspirational_rates.iter().sum::<f64>() / aspirational_len_f64;

    let coverage = u32::try_from(per_virtue_captures.values().filter(|&&count| count > 0).count()).unwrap_or(u32::MAX);

    let dominance = per_virtue_captures
        .values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let count_f64 = count as f64;
            count_f64 / total_f64
        })
        .fold(0.0_f64, f64::max);

    #[allow(clippy::cast_precision_loss)]
    let escapes_f64 = escapes as f64;
    let escape_rate = escapes_f64 / total_f64;

    #[allow(clippy::cast_precision_loss)]
    let mean_capture_step = if capture_steps.is_empty() {
        0.0
    } else {
        let sum: u32 = capture_steps.iter().sum();
        let sum_f64 = f64::from(sum);
        let len_f64 = capture_steps.len() as f64;
        sum_f64 / len_f64
    };

    let overall_rate = 1.0 - escape_rate;
    let growth_delta = previous.map(|report| overall_rate - report.overall_rate());

    let verdict = classify(coherence_config, foundation_rate, aspirational_rate, coverage, dominance, growth_delta);

    Ok(CoherenceReport {
        foundation_rate,
        aspirational_rate,
        coverage,
        dominance,
        escape_rate,
        per_virtue_captures,
        mean_capture_step,
        growth_delta,
        verdict,
    })
}

fn classify(
    config: &CoherenceConfig,
    foundation_rate: f64,
    aspirational_rate: f64,
    coverage: u32,
    dominance: f64,
    growth_delta: Option<f64>,
) -> CoherenceVerdict {
    if foundation_rate < config.foundation_threshold {
        return CoherenceVerdict::FoundationFailed;
    }
    let coherent = aspirational_rate >= config.aspirational_threshold
        && coverage >= config.min_coverage
        && dominance <= config.max_dominance;
    if coherent {
        return CoherenceVerdict::Coherent;
    }
    if growth_delta.is_some_and(|delta| delta >= config.growth_threshold) {
        return CoherenceVerdict::Growing;
    }
    CoherenceVerdict::Struggling
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_graph::VirtueDefinition;
    use kiln_types::{AgentId, AgentStatus, Archetype, NodeId, Tier};

    fn registry_substrate() -> (GraphSubstrate, VirtueRegistry) {
        let mut substrate = GraphSubstrate::new();
        let mut registry = VirtueRegistry::new();
        let defs: Vec<VirtueDefinition> = (1..=19)
            .map(|n| VirtueDefinition {
                id: VirtueId::from_ordinal(n).unwrap(),
                name: format!("virtue-{n}"),
                tier: if n == 1 { Tier::Foundation } else { Tier::Aspirational },
                cluster: Archetype::Guardian,
                base_threshold: 0.5,
                baseline_activation: 0.1,
            })
            .collect();
        registry.initialize(&mut substrate, defs).unwrap();
        (substrate, registry)
    }

    fn test_agent() -> Agent {
        Agent {
            id: AgentId::new(),
            archetype: Archetype::Guardian,
            generation: 5,
            parent_ids: Vec::new(),
            binding: None,
            status: AgentStatus::Evolving,
        }
    }

    #[test]
    fn never_capturing_foundation_yields_foundation_failed() {
        let (mut substrate, registry) = registry_substrate();
        let mut overlay = TopologyOverlay::new();
        let concept = substrate.create_concept("seed", 0.1);
        let aspirational = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(NodeId::Concept(concept), aspirational, 1.0).unwrap();

        let dynamics_config = DynamicsConfig::default();
        let coherence_config = CoherenceConfig {
            n_stimuli: 5,
            ..CoherenceConfig::default()
        };
        let agent = test_agent();
        let report = evaluate(&substrate, &overlay, &registry, &dynamics_config, &coherence_config, &agent, None).unwrap();

        assert!((report.foundation_rate - 0.0).abs() < 1e-9);
        assert_eq!(report.verdict, CoherenceVerdict::FoundationFailed);
    }

    #[test]
    fn no_eligible_stimuli_propagates_error() {
        let (substrate, registry) = registry_substrate();
        let overlay = TopologyOverlay::new();
        let dynamics_config = DynamicsConfig::default();
        let coherence_config = CoherenceConfig::default();
        let agent = test_agent();
        let err = evaluate(&substrate, &overlay, &registry, &dynamics_config, &coherence_config, &agent, None).unwrap_err();
        assert!(matches!(err, CoherenceError::NoEligibleStimuli));
    }
}
