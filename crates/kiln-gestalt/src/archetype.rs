//! Archetype derivation: argmax over cluster affinities with a minimum
//! margin, else `Untyped`.

use std::collections::BTreeMap;

use kiln_graph::VirtueRegistry;
use kiln_types::{Archetype, VirtueId};

/// The four derivable archetypes, in the fixed order the one-hot
/// embedding segment uses.
pub const ARCHETYPES: [Archetype; 4] = [Archetype::Guardian, Archetype::Seeker, Archetype::Servant, Archetype::Contemplative];

/// Sum activation per cluster: each virtue's activation contributes to
/// the affinity of the archetype its `cluster` field names.
pub fn cluster_affinities(registry: &VirtueRegistry, activations: &BTreeMap<VirtueId, f64>) -> BTreeMap<Archetype, f64> {
    let mut affinities: BTreeMap<Archetype, f64> = ARCHETYPES.iter().map(|&a| (a, 0.0)).collect();
    for anchor in registry.list_virtues() {
        if registry.is_foundation(anchor.id) {
            continue;
        }
        let activation = activations.get(&anchor.id).copied().unwrap_or(0.0);
        if let Some(total) = affinities.get_mut(&anchor.cluster) {
            *total += activation;
        }
    }
    affinities
}

/// Derive the archetype: the cluster with the highest affinity, provided
/// it leads the runner-up by at least `margin`; otherwise `Untyped`.
pub fn derive_archetype(affinities: &BTreeMap<Archetype, f64>, margin: f64) -> Archetype {
    let mut sorted: Vec<(Archetype, f64)> = affinities.iter().map(|(&a, &v)| (a, v)).collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    match (sorted.first(), sorted.get(1)) {
        (Some(&(leader, leader_score)), Some(&(_, runner_up_score))) => {
            if leader_score - runner_up_score >= margin {
                leader
            } else {
                Archetype::Untyped
            }
        }
        (Some(&(leader, _)), None) => leader,
        (None, _) => Archetype::Untyped,
    }
}

/// One-hot encode an archetype over [`ARCHETYPES`]' fixed order.
/// `Untyped` encodes as all zeros.
pub fn archetype_one_hot(archetype: Archetype) -> [f64; 4] {
    let mut one_hot = [0.0; 4];
    if let Some(index) = ARCHETYPES.iter().position(|&a| a == archetype) {
        if let Some(slot) = one_hot.get_mut(index) {
            *slot = 1.0;
        }
    }
    one_hot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_leader_above_margin_wins() {
        let mut affinities = BTreeMap::new();
        affinities.insert(Archetype::Guardian, 0.9);
        affinities.insert(Archetype::Seeker, 0.5);
        affinities.insert(Archetype::Servant, 0.2);
        affinities.insert(Archetype::Contemplative, 0.1);
        assert_eq!(derive_archetype(&affinities, 0.10), Archetype::Guardian);
    }

    #[test]
    fn close_race_is_untyped() {
        let mut affinities = BTreeMap::new();
        affinities.insert(Archetype::Guardian, 0.51);
        affinities.insert(Archetype::Seeker, 0.50);
        affinities.insert(Archetype::Servant, 0.2);
        affinities.insert(Archetype::Contemplative, 0.1);
        assert_eq!(derive_archetype(&affinities, 0.10), Archetype::Untyped);
    }

    #[test]
    fn one_hot_marks_single_position() {
        let encoded = archetype_one_hot(Archetype::Servant);
        assert_eq!(encoded, [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn untyped_one_hot_is_all_zero() {
        assert_eq!(archetype_one_hot(Archetype::Untyped), [0.0; 4]);
    }
}
