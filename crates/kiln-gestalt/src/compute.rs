//! `compute_gestalt`: ties activation snapshot, character signature,
//! tendencies, archetype, and embedding into one [`Gestalt`].

use std::collections::BTreeMap;

use kiln_graph::{TopologyOverlay, VirtueRegistry};
use kiln_types::{AgentId, Gestalt, VirtueId};

use crate::archetype::{archetype_one_hot, cluster_affinities, derive_archetype};
use crate::config::GestaltConfig;
use crate::embedding::build_embedding;
use crate::relation::relation_stats;
use crate::signature::character_signature;
use crate::tendency::score_tendencies;

/// Derive a [`Gestalt`] for `agent_id` from its current activation
/// snapshot, its overlay topology, and the capture tally of its most
/// recent [`kiln_types::CoherenceReport`].
///
/// `activations` is the per-anchor activation snapshot from the agent's
/// last evaluation (e.g. the mean final-step activation across sampled
/// trajectories); anchors absent from the map are treated as `0.0`.
pub fn compute_gestalt(
    agent_id: AgentId,
    registry: &VirtueRegistry,
    overlay: &TopologyOverlay,
    activations: &BTreeMap<VirtueId, f64>,
    per_virtue_captures: &BTreeMap<VirtueId, u32>,
    config: &GestaltConfig,
) -> Gestalt {
    let ordered_activations: Vec<f64> = registry.list_virtues().map(|a| activations.get(&a.id).copied().unwrap_or(0.0)).collect();

    let tendency_scores = score_tendencies(&config.tendencies, activations);
    let ordered_tendencies: Vec<f64> = config.tendencies.iter().map(|t| tendency_scores.get(&t.name).copied().unwrap_or(0.0)).collect();

    let affinities = cluster_affinities(registry, activations);
    let archetype = derive_archetype(&affinities, config.archetype_margin);
    let one_hot = archetype_one_hot(archetype);

    let relation = relation_stats(overlay);

    let embedding = build_embedding(&ordered_activations, &ordered_tendencies, relation, one_hot);

    Gestalt {
        agent_id,
        activations: registry.list_virtues().map(|a| (a.id, activations.get(&a.id).copied().unwrap_or(0.0))).collect(),
        character_signature: character_signature(per_virtue_captures),
        tendencies: tendency_scores,
        archetype,
        embedding,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_graph::{GraphSubstrate, VirtueDefinition};
    use kiln_types::{Archetype, Tier};

    fn registry() -> VirtueRegistry {
        let mut substrate = GraphSubstrate::new();
        let mut registry = VirtueRegistry::new();
        let clusters = [Archetype::Guardian, Archetype::Seeker, Archetype::Servant, Archetype::Contemplative];
        let defs: Vec<VirtueDefinition> = (1..=19)
            .map(|n| VirtueDefinition {
                id: VirtueId::from_ordinal(n).unwrap(),
                name: format!("virtue-{n}"),
                tier: if n == 1 { Tier::Foundation } else { Tier::Aspirational },
                cluster: clusters[usize::from(n) % clusters.len()],
                base_threshold: 0.7,
                baseline_activation: 0.3,
            })
            .collect();
        registry.initialize(&mut substrate, defs).unwrap();
        registry
    }

    #[test]
    fn embedding_has_41_dimensions() {
        let registry = registry();
        let config = GestaltConfig::from_registry(&registry);
        let overlay = TopologyOverlay::new();
        let activations = BTreeMap::new();
        let captures = BTreeMap::new();
        let gestalt = compute_gestalt(AgentId::new(), &registry, &overlay, &activations, &captures, &config);
        assert_eq!(gestalt.embedding.len(), crate::config::EMBEDDING_DIM);
        assert_eq!(gestalt.tendencies.len(), crate::config::TENDENCY_COUNT);
        assert_eq!(gestalt.activations.len(), usize::from(VirtueId::COUNT));
    }

    #[test]
    fn strong_guardian_activation_derives_guardian_archetype() {
        let registry = registry();
        let config = GestaltConfig::from_registry(&registry);
        let overlay = TopologyOverlay::new();
        let mut activations = BTreeMap::new();
        for anchor in registry.list_virtues() {
            let value = if anchor.cluster == Archetype::Guardian { 1.0 } else { 0.0 };
            activations.insert(anchor.id, value);
        }
        let captures = BTreeMap::new();
        let gestalt = compute_gestalt(AgentId::new(), &registry, &overlay, &activations, &captures, &config);
        assert_eq!(gestalt.archetype, Archetype::Guardian);
    }

    #[test]
    fn no_anchor_affinity_is_untyped() {
        let registry = registry();
        let config = GestaltConfig::from_registry(&registry);
        let overlay = TopologyOverlay::new();
        let activations = BTreeMap::new();
        let captures = BTreeMap::new();
        let gestalt = compute_gestalt(AgentId::new(), &registry, &overlay, &activations, &captures, &config);
        assert_eq!(gestalt.archetype, Archetype::Untyped);
    }
}
