//! Relation statistics: an 8-dimensional summary of an agent's overlay
//! topology, the `relation_stats(8)` segment of the embedding.

use kiln_graph::TopologyOverlay;

/// Compute the 8 relation statistics for `overlay`:
///
/// 0. mean edge weight
/// 1. max edge weight
/// 2. edge weight population standard deviation
/// 3. edge density, `tanh(edge_count / 50)` to keep the statistic bounded
///    regardless of topology size
/// 4. mean use count, `tanh(mean_use_count / 10)`
/// 5. fraction of edges targeting an anchor
/// 6. fraction of edges never traversed (`use_count == 0`)
/// 7. fraction of edges sourced from a concept (as opposed to an anchor
///    baseline-seeding edge)
///
/// All 8 values are in `[0, 1]`. An empty overlay yields all zeros.
#[allow(clippy::arithmetic_side_effects)]
pub fn relation_stats(overlay: &TopologyOverlay) -> [f64; 8] {
    let edges: Vec<_> = overlay.iter_edges(|_, _, _| true).collect();
    let count = edges.len();
    if count == 0 {
        return [0.0; 8];
    }

    #[allow(clippy::cast_precision_loss)]
    let count_f64 = count as f64;

    let weights: Vec<f64> = edges.iter().map(|(_, _, edge)| edge.weight).collect();
    let mean_weight = weights.iter().sum::<f64>() / count_f64;
    let max_weight = weights.iter().copied().fold(0.0_f64, f64::max);
    let variance = weights.iter().map(|w| (w - mean_weight).powi(2)).sum::<f64>() / count_f64;
    let weight_stddev = variance.sqrt();

    let edge_density = (count_f64 / 50.0).tanh();

    #[allow(clippy::cast_precision_loss)]
    let mean_use_count = edges.iter().map(|(_, _, edge)| edge.use_count).sum::<u64>() as f64 / count_f64;
    let use_count_stat = (mean_use_count / 10.0).tanh();

    let anchor_targeted = edges.iter().filter(|(_, tgt, _)| tgt.is_anchor()).count();
    #[allow(clippy::cast_precision_loss)]
    let anchor_targeted_fraction = anchor_targeted as f64 / count_f64;

    let never_used = edges.iter().filter(|(_, _, edge)| edge.use_count == 0).count();
    #[allow(clippy::cast_precision_loss)]
    let never_used_fraction = never_used as f64 / count_f64;

    let concept_sourced = edges.iter().filter(|(src, _, _)| !src.is_anchor()).count();
    #[allow(clippy::cast_precision_loss)]
    let concept_sourced_fraction = concept_sourced as f64 / count_f64;

    [
        mean_weight,
        max_weight,
        weight_stddev,
        edge_density,
        use_count_stat,
        anchor_targeted_fraction,
        never_used_fraction,
        concept_sourced_fraction,
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use kiln_types::{ConceptId, NodeId, VirtueId};

    #[test]
    fn empty_overlay_is_all_zero() {
        let overlay = TopologyOverlay::new();
        assert_eq!(relation_stats(&overlay), [0.0; 8]);
    }

    #[test]
    fn single_edge_has_expected_mean_and_max() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(1).unwrap());
        overlay.upsert_edge(concept, anchor, 0.6).unwrap();
        let stats = relation_stats(&overlay);
        assert!((stats[0] - 0.6).abs() < 1e-9);
        assert!((stats[1] - 0.6).abs() < 1e-9);
        assert!((stats[5] - 1.0).abs() < 1e-9);
    }
}
