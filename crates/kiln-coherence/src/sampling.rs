//! Deterministic stimulus sampling: uniform over concepts with at least
//! one outgoing edge, seeded by the evaluated agent's id.

use kiln_graph::{GraphSubstrate, TopologyOverlay};
use kiln_types::{AgentId, NodeId};
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::CoherenceError;

/// Derive a deterministic seed from an agent id so repeated evaluations
/// of the same agent draw the same stimulus sample.
fn seed_for(agent_id: AgentId) -> u64 {
    let (hi, lo) = agent_id.into_inner().as_u64_pair();
    hi ^ lo
}

/// Draw `n` stimulus concepts, with replacement, uniformly over every
/// concept in `substrate` that has at least one outgoing edge in
/// `overlay`.
///
/// # Errors
///
/// Returns [`CoherenceError::NoEligibleStimuli`] if no concept in the
/// substrate has an outgoing edge.
pub fn sample_stimuli(
    substrate: &GraphSubstrate,
    overlay: &TopologyOverlay,
    agent_id: AgentId,
    n: u32,
) -> Result<Vec<NodeId>, CoherenceError> {
    let eligible: Vec<NodeId> = substrate
        .concept_ids()
        .map(NodeId::Concept)
        .filter(|&node| overlay.has_outgoing(node))
        .collect();

    if eligible.is_empty() {
        return Err(CoherenceError::NoEligibleStimuli);
    }

    let mut rng = StdRng::seed_from_u64(seed_for(agent_id));
    let sample = (0..n)
        .filter_map(|_| eligible.choose(&mut rng).copied())
        .collect();
    Ok(sample)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn same_agent_id_draws_the_same_sample_twice() {
        let mut substrate = GraphSubstrate::new();
        let mut overlay = TopologyOverlay::new();
        let a = substrate.create_concept("a", 0.1);
        let b = substrate.create_concept("b", 0.1);
        overlay.upsert_edge(NodeId::Concept(a), NodeId::Concept(b), 0.5).unwrap();
        overlay.upsert_edge(NodeId::Concept(b), NodeId::Concept(a), 0.5).unwrap();

        let agent_id = AgentId::new();
        let first = sample_stimuli(&substrate, &overlay, agent_id, 20).unwrap();
        let second = sample_stimuli(&substrate, &overlay, agent_id, 20).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_eligible_stimuli_errors() {
        let substrate = GraphSubstrate::new();
        let overlay = TopologyOverlay::new();
        let err = sample_stimuli(&substrate, &overlay, AgentId::new(), 10).unwrap_err();
        assert!(matches!(err, CoherenceError::NoEligibleStimuli));
    }
}
