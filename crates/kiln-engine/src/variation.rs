//! Crossover and mutation operators that produce Kiln offspring overlays.

use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use rand::Rng;
use rand_distr::{Beta, Distribution, Normal};

use kiln_graph::{check_anchor_reachability, GraphSubstrate, TopologyOverlay};
use kiln_types::{NodeId, VirtueId};

use crate::config::KilnConfig;
use crate::error::EngineError;

/// Edge weight seeded on a freshly added concept-to-anchor edge.
const NEW_EDGE_WEIGHT: f64 = 0.1;

/// Blend two parent overlays into one offspring overlay.
///
/// For every edge key present in either parent, draw a fresh blend weight
/// `alpha ~ Beta(2, 2)` and set the offspring weight to
/// `alpha * w_a + (1 - alpha) * w_b`. An edge present in only one parent is
/// carried over unchanged -- there is nothing to blend it against.
#[allow(clippy::arithmetic_side_effects)]
pub fn crossover(a: &TopologyOverlay, b: &TopologyOverlay, rng: &mut impl Rng) -> Result<TopologyOverlay, EngineError> {
    let beta = Beta::new(2.0, 2.0).map_err(|_| EngineError::InvalidDistribution)?;
    let mut offspring = TopologyOverlay::new();

    let mut keys: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
    for (src, tgt, _) in a.iter_edges(|_, _, _| true) {
        keys.insert((src, tgt));
    }
    for (src, tgt, _) in b.iter_edges(|_, _, _| true) {
        keys.insert((src, tgt));
    }

    for (src, tgt) in keys {
        let wa = a.get_edge(src, tgt).map(|edge| edge.weight);
        let wb = b.get_edge(src, tgt).map(|edge| edge.weight);
        let weight = match (wa, wb) {
            (Some(wa), Some(wb)) => {
                let alpha: f64 = beta.sample(rng);
                alpha.mul_add(wa, (1.0 - alpha) * wb)
            }
            (Some(w), None) | (None, Some(w)) => w,
            (None, None) => continue,
        };
        offspring.upsert_edge(src, tgt, weight.clamp(0.0, 1.0))?;
    }

    Ok(offspring)
}

/// Mutate `overlay` in place: per-edge Gaussian jitter with probability
/// `mutation_rate`, then one attempt to add a new concept-to-anchor edge
/// with probability `p_add`, then one attempt to remove the weakest edge
/// with probability `p_del` (skipped if removal would break anchor
/// reachability, the same clamp-instead-of-break rule the decay pass
/// uses for I3).
pub fn mutate(substrate: &GraphSubstrate, overlay: &mut TopologyOverlay, config: &KilnConfig, rng: &mut impl Rng) -> Result<(), EngineError> {
    jitter_edges(overlay, config, rng);

    if rng.random_bool(config.p_add) {
        add_random_edge(substrate, overlay, rng)?;
    }
    if rng.random_bool(config.p_del) {
        remove_weakest_edge(substrate, overlay)?;
    }
    Ok(())
}

#[allow(clippy::arithmetic_side_effects)]
fn jitter_edges(overlay: &mut TopologyOverlay, config: &KilnConfig, rng: &mut impl Rng) {
    let normal = Normal::new(0.0, config.mutation_noise_sigma).ok();
    for (_, _, edge) in overlay.iter_edges_mut() {
        if !rng.random_bool(config.mutation_rate) {
            continue;
        }
        let noise = normal.map_or(0.0, |n: Normal<f64>| n.sample(rng));
        edge.weight = (edge.weight + noise).clamp(0.0, 1.0);
    }
}

fn add_random_edge(substrate: &GraphSubstrate, overlay: &mut TopologyOverlay, rng: &mut impl Rng) -> Result<(), EngineError> {
    let concepts: Vec<_> = substrate.concept_ids().collect();
    let anchors: Vec<VirtueId> = substrate.anchors().map(|anchor| anchor.id).collect();
    let (Some(&concept), Some(&anchor)) = (concepts.choose(rng), anchors.choose(rng)) else {
        return Ok(());
    };
    overlay.upsert_edge(NodeId::Concept(concept), NodeId::Anchor(anchor), NEW_EDGE_WEIGHT)?;
    Ok(())
}

fn remove_weakest_edge(substrate: &GraphSubstrate, overlay: &mut TopologyOverlay) -> Result<(), EngineError> {
    let weakest = overlay
        .iter_edges(|_, _, _| true)
        .min_by(|(_, _, a), (_, _, b)| a.weight.partial_cmp(&b.weight).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(src, tgt, _)| (src, tgt));
    let Some((src, tgt)) = weakest else {
        return Ok(());
    };
    let Some(removed) = overlay.remove_edge(src, tgt) else {
        return Ok(());
    };
    if check_anchor_reachability(substrate, overlay).is_err() {
        overlay.upsert_edge(src, tgt, removed.weight)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_graph::VirtueRegistry;
    use kiln_types::{Tier, Archetype};
    use kiln_graph::VirtueDefinition;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn substrate_with_one_concept() -> (GraphSubstrate, VirtueRegistry, kiln_types::ConceptId) {
        let mut substrate = GraphSubstrate::new();
        let mut registry = VirtueRegistry::new();
        let defs: Vec<VirtueDefinition> = (1..=19)
            .map(|n| VirtueDefinition {
                id: VirtueId::from_ordinal(n).unwrap(),
                name: format!("virtue-{n}"),
                tier: if n == 1 { Tier::Foundation } else { Tier::Aspirational },
                cluster: Archetype::Guardian,
                base_threshold: 0.7,
                baseline_activation: 0.3,
            })
            .collect();
        registry.initialize(&mut substrate, defs).unwrap();
        let concept = substrate.create_concept("seed".to_owned(), 0.1);
        (substrate, registry, concept)
    }

    #[test]
    fn crossover_carries_over_edges_unique_to_one_parent() {
        let (substrate, _registry, concept) = substrate_with_one_concept();
        let mut a = TopologyOverlay::new();
        a.upsert_edge(NodeId::Concept(concept), NodeId::Anchor(VirtueId::FOUNDATION), 0.6).unwrap();
        let b = TopologyOverlay::new();
        let mut rng = StdRng::seed_from_u64(1);
        let offspring = crossover(&a, &b, &mut rng).unwrap();
        let _ = substrate;
        assert_eq!(offspring.get_edge(NodeId::Concept(concept), NodeId::Anchor(VirtueId::FOUNDATION)).unwrap().weight, 0.6);
    }

    #[test]
    fn crossover_blends_shared_edges_between_parent_weights() {
        let (_, _, concept) = substrate_with_one_concept();
        let mut a = TopologyOverlay::new();
        a.upsert_edge(NodeId::Concept(concept), NodeId::Anchor(VirtueId::FOUNDATION), 0.0).unwrap();
        let mut b = TopologyOverlay::new();
        b.upsert_edge(NodeId::Concept(concept), NodeId::Anchor(VirtueId::FOUNDATION), 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let offspring = crossover(&a, &b, &mut rng).unwrap();
        let weight = offspring.get_edge(NodeId::Concept(concept), NodeId::Anchor(VirtueId::FOUNDATION)).unwrap().weight;
        assert!((0.0..=1.0).contains(&weight));
    }

    #[test]
    fn mutate_never_breaks_anchor_reachability() {
        let (substrate, _registry, concept) = substrate_with_one_concept();
        let mut overlay = TopologyOverlay::new();
        overlay.upsert_edge(NodeId::Concept(concept), NodeId::Anchor(VirtueId::FOUNDATION), 0.9).unwrap();
        let config = KilnConfig { p_del: 1.0, p_add: 0.0, mutation_rate: 0.0, ..KilnConfig::default() };
        let mut rng = StdRng::seed_from_u64(5);
        mutate(&substrate, &mut overlay, &config, &mut rng).unwrap();
        assert!(check_anchor_reachability(&substrate, &overlay).is_ok());
    }
}
