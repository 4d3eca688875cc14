//! Typed configuration for the Gestalt Analyzer: the published tendency
//! weights, archetype margin, and default cluster count.

use std::collections::BTreeMap;

use kiln_graph::VirtueRegistry;
use kiln_types::{Archetype, VirtueId};

/// Number of dimensions in a [`kiln_types::Gestalt`] embedding:
/// `activations(19) || tendencies(10) || relation_stats(8) ||
/// archetype_onehot(4)`.
pub const EMBEDDING_DIM: usize = 41;

/// Number of behavioral tendencies derived per agent.
pub const TENDENCY_COUNT: usize = 10;

/// Number of relation-statistics dimensions derived from an overlay.
pub const RELATION_STATS_DIM: usize = 8;

/// Number of archetypes (including `Untyped`, which the one-hot never sets).
pub const ARCHETYPE_DIM: usize = 4;

/// Minimum lead the top cluster affinity must hold over the runner-up for
/// `derive_archetype` to commit to that archetype instead of `Untyped`.
pub const ARCHETYPE_MARGIN: f64 = 0.10;

/// One published behavioral tendency: a name and a weighted sum over
/// designated virtues. Weights need not sum to 1; the published set is
/// normalized per-tendency so scores stay comparable across agents with
/// different registry weight totals.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TendencyDefinition {
    /// The tendency's name, used as the key in [`kiln_types::Gestalt::tendencies`].
    pub name: String,
    /// Per-virtue weights contributing to this tendency's score.
    pub weights: BTreeMap<VirtueId, f64>,
}

/// Tunable constants governing tendency weighting, archetype derivation,
/// and clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct GestaltConfig {
    /// The ten published tendency definitions.
    pub tendencies: Vec<TendencyDefinition>,
    /// Minimum lead for archetype commitment; see [`ARCHETYPE_MARGIN`].
    pub archetype_margin: f64,
    /// Default cluster count for [`crate::kmeans::k_means`].
    pub k_clusters: usize,
}

impl GestaltConfig {
    /// Build the default tendency set from a registry's cluster
    /// assignments: two tendencies per archetype cluster (splitting that
    /// cluster's virtues by ordinal parity), one weighted solely on the
    /// Foundation virtue, and one spread uniformly across every virtue.
    pub fn from_registry(registry: &VirtueRegistry) -> Self {
        Self {
            tendencies: default_tendencies(registry),
            archetype_margin: ARCHETYPE_MARGIN,
            k_clusters: 4,
        }
    }
}

const CLUSTER_TENDENCY_NAMES: [(Archetype, &str, &str); 4] = [
    (Archetype::Guardian, "vigilance", "stewardship"),
    (Archetype::Seeker, "curiosity", "candor"),
    (Archetype::Servant, "devotion", "selflessness"),
    (Archetype::Contemplative, "equanimity", "discernment"),
];

fn default_tendencies(registry: &VirtueRegistry) -> Vec<TendencyDefinition> {
    let mut by_cluster: BTreeMap<Archetype, Vec<VirtueId>> = BTreeMap::new();
    let mut all_virtues: Vec<VirtueId> = Vec::new();
    let mut foundation_id = VirtueId::FOUNDATION;

    for anchor in registry.list_virtues() {
        all_virtues.push(anchor.id);
        if registry.is_foundation(anchor.id) {
            foundation_id = anchor.id;
        } else {
            by_cluster.entry(anchor.cluster).or_default().push(anchor.id);
        }
    }

    let mut tendencies = Vec::with_capacity(TENDENCY_COUNT);
    for (cluster, primary_name, secondary_name) in CLUSTER_TENDENCY_NAMES {
        let members = by_cluster.get(&cluster).cloned().unwrap_or_default();
        let (primary, secondary): (Vec<VirtueId>, Vec<VirtueId>) =
            members.into_iter().enumerate().partition(|&(index, _)| index % 2 == 0);
        tendencies.push(uniform_tendency(primary_name, primary.into_iter().map(|(_, v)| v).collect()));
        tendencies.push(uniform_tendency(secondary_name, secondary.into_iter().map(|(_, v)| v).collect()));
    }

    tendencies.push(uniform_tendency("integrity", vec![foundation_id]));
    tendencies.push(uniform_tendency("resilience", all_virtues));
    tendencies
}

fn uniform_tendency(name: &str, members: Vec<VirtueId>) -> TendencyDefinition {
    #[allow(clippy::cast_precision_loss)]
    let weight = if members.is_empty() { 0.0 } else { 1.0 / members.len() as f64 };
    let weights = members.into_iter().map(|v| (v, weight)).collect();
    TendencyDefinition { name: name.to_owned(), weights }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_graph::{GraphSubstrate, VirtueDefinition};
    use kiln_types::Tier;

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
    fn default_tendencies_has_ten_entries() {
        let config = GestaltConfig::from_registry(&registry());
        assert_eq!(config.tendencies.len(), TENDENCY_COUNT);
    }

    #[test]
    fn integrity_tendency_weighs_only_foundation() {
        let config = GestaltConfig::from_registry(&registry());
        let integrity = config.tendencies.iter().find(|t| t.name == "integrity").unwrap();
        assert_eq!(integrity.weights.len(), 1);
        assert!(integrity.weights.contains_key(&VirtueId::FOUNDATION));
    }

    #[test]
    fn resilience_tendency_spans_every_virtue() {
        let config = GestaltConfig::from_registry(&registry());
        let resilience = config.tendencies.iter().find(|t| t.name == "resilience").unwrap();
        assert_eq!(resilience.weights.len(), usize::from(VirtueId::COUNT));
    }
}
