//! Hebbian reinforcement and anti-Hebbian dampening applied after a
//! trajectory run completes.

use std::collections::BTreeMap;

use kiln_graph::TopologyOverlay;
use kiln_types::NodeId;

use crate::config::DynamicsConfig;

/// Apply the Hebbian update for a captured trajectory's path, or
/// anti-Hebbian dampening for an escaped one.
///
/// For each consecutive pair `(j, i)` in `path` with an edge `j -> i` in
/// `overlay`, and `captured` true:
///
/// ```text
/// W_ij <- clamp(W_ij + LEARNING_RATE * mean(x_i * x_j over dwell window), 0, 1)
/// use_count(j -> i) += 1
/// last_used(j -> i) = now
/// ```
///
/// If `captured` is false and `config.anti_hebbian_enabled`, every
/// traversed edge is scaled by `0.999` instead, with no use-count update.
// Edge weights are clamped to [0, 1] after every reinforcement and
// use_count saturates in practice well below u64::MAX.
#[allow(clippy::arithmetic_side_effects)]
#[allow(clippy::too_many_arguments)]
pub fn apply(
    overlay: &mut TopologyOverlay,
    config: &DynamicsConfig,
    path: &[NodeId],
    dwell_history: &BTreeMap<NodeId, Vec<f64>>,
    captured: bool,
    now: chrono::DateTime<chrono::Utc>,
) {
    if path.len() < 2 {
        return;
    }

    for window in path.windows(2) {
        let [j, i] = window else {
            continue;
        };
        let (j, i) = (*j, *i);
        let Some(edge) = overlay.get_edge_mut(j, i) else {
            continue;
        };

        if captured {
            let reinforcement = config.learning_rate * mean_product(dwell_history, i, j);
            edge.weight = (edge.weight + reinforcement).clamp(0.0, 1.0);
            edge.use_count = edge.use_count.saturating_add(1);
            edge.last_used = Some(now);
        } else if config.anti_hebbian_enabled {
            edge.weight *= 0.999;
        }
    }
}

#[allow(clippy::arithmetic_side_effects)]
fn mean_product(dwell_history: &BTreeMap<NodeId, Vec<f64>>, i: NodeId, j: NodeId) -> f64 {
    let Some(xi) = dwell_history.get(&i) else {
        return 0.0;
    };
    let Some(xj) = dwell_history.get(&j) else {
        return 0.0;
    };
    let n = xi.len().min(xj.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = xi.iter().rev().take(n).zip(xj.iter().rev().take(n)).map(|(a, b)| a * b).sum();
    #[allow(clippy::cast_precision_loss)]
    let n_f64 = n as f64;
    sum / n_f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_types::{ConceptId, VirtueId};

    #[test]
    fn captured_path_reinforces_edges() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(concept, anchor, 0.5).unwrap();

        let mut history = BTreeMap::new();
        history.insert(concept, vec![1.0, 1.0]);
        history.insert(anchor, vec![0.9, 0.95]);

        let config = DynamicsConfig::default();
        apply(&mut overlay, &config, &[concept, anchor], &history, true, chrono::Utc::now());

        let edge = overlay.get_edge(concept, anchor).unwrap();
        assert!(edge.weight > 0.5);
        assert_eq!(edge.use_count, 1);
        assert!(edge.last_used.is_some());
    }

    #[test]
    fn escaped_path_applies_anti_hebbian_when_enabled() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(concept, anchor, 0.5).unwrap();

        let config = DynamicsConfig {
            anti_hebbian_enabled: true,
            ..DynamicsConfig::default()
        };
        apply(&mut overlay, &config, &[concept, anchor], &BTreeMap::new(), false, chrono::Utc::now());

        let edge = overlay.get_edge(concept, anchor).unwrap();
        assert!((edge.weight - 0.5 * 0.999).abs() < 1e-12);
        assert_eq!(edge.use_count, 0);
    }
}
