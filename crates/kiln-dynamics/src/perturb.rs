//! Perturbation: inject noise into stagnant edges so the topology keeps
//! exploring instead of freezing at a local optimum.
//!
//! Cadence (every `PERTURB_INTERVAL` lifetime steps) is the caller's
//! responsibility -- this module performs exactly one pass per call.

use rand::Rng;

use kiln_graph::TopologyOverlay;

use crate::config::DynamicsConfig;

/// Inject uniform noise in `[-strength/2, strength/2]` into every edge
/// whose `use_count` is still zero, clamping the result to `[0, 1]`.
#[allow(clippy::arithmetic_side_effects)]
pub fn apply(overlay: &mut TopologyOverlay, config: &DynamicsConfig, rng: &mut impl Rng) {
    let half = config.perturb_strength / 2.0;
    for (_, _, edge) in overlay.iter_edges_mut() {
        if edge.use_count != 0 {
            continue;
        }
        let noise: f64 = rng.random_range(-half..=half);
        edge.weight = (edge.weight + noise).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_types::{ConceptId, NodeId, VirtueId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn unused_edge_weight_stays_in_bounds() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(concept, anchor, 0.95).unwrap();

        let config = DynamicsConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        apply(&mut overlay, &config, &mut rng);

        let weight = overlay.get_edge(concept, anchor).unwrap().weight;
        assert!((0.0..=1.0).contains(&weight));
    }

    #[test]
    fn used_edges_are_untouched() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(concept, anchor, 0.5).unwrap();
        if let Some(edge) = overlay.get_edge_mut(concept, anchor) {
            edge.use_count = 1;
        }

        let config = DynamicsConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        apply(&mut overlay, &config, &mut rng);

        assert!((overlay.get_edge(concept, anchor).unwrap().weight - 0.5).abs() < 1e-12);
    }
}
