//! Batch invariant checks (I1, I2, I3, I5) that span the substrate and
//! an overlay together.
//!
//! I2 (no anchor cross-talk) and I4 (weight bounds) are enforced at the
//! point of mutation by [`crate::overlay::TopologyOverlay::upsert_edge`]
//! and [`crate::overlay::TopologyOverlay::check_weight_bounds`]
//! respectively, since those are cheap to check per-call. I1, I3, and I5
//! are whole-graph properties, checked after the batch mutations that
//! could plausibly break them (anchor installation, edge removal, decay,
//! healing) or after a session reload, which deserializes an overlay
//! directly and so bypasses `upsert_edge` entirely. [`check_no_anchor_cross_talk`]
//! re-verifies I2 for exactly that reason: a reloaded overlay never
//! passed through `upsert_edge`'s own check.

use std::collections::{BTreeSet, VecDeque};

use kiln_types::{Direction, NodeId, Tier};

use crate::error::{GraphError, InvariantKind};
use crate::overlay::TopologyOverlay;
use crate::substrate::GraphSubstrate;

/// Check I1: the anchor set has cardinality 19 and exactly one Foundation
/// virtue.
///
/// # Errors
///
/// Returns [`GraphError::InvariantBroken`] if either condition fails.
pub fn check_anchor_set_shape(substrate: &GraphSubstrate) -> Result<(), GraphError> {
    if substrate.anchor_count() != usize::from(kiln_types::VirtueId::COUNT) {
        return Err(GraphError::InvariantBroken {
            kind: InvariantKind::AnchorSetShape,
        });
    }
    let foundation_count = substrate
        .anchors()
        .filter(|a| matches!(a.tier, Tier::Foundation))
        .count();
    if foundation_count == 1 {
        Ok(())
    } else {
        Err(GraphError::InvariantBroken {
            kind: InvariantKind::AnchorSetShape,
        })
    }
}

/// Check I3: every anchor is reachable from some concept via edges of
/// positive weight, within this overlay.
///
/// Reachability runs a reverse BFS from each anchor over incoming edges;
/// an anchor is reachable once the BFS touches any concept node.
///
/// # Errors
///
/// Returns [`GraphError::InvariantBroken`] naming the first unreachable
/// anchor found.
pub fn check_anchor_reachability(
    substrate: &GraphSubstrate,
    overlay: &TopologyOverlay,
) -> Result<(), GraphError> {
    for anchor in substrate.anchors() {
        if !is_anchor_reachable(overlay, NodeId::Anchor(anchor.id)) {
            return Err(GraphError::InvariantBroken {
                kind: InvariantKind::AnchorReachability,
            });
        }
    }
    Ok(())
}

/// Check I2: no edge in `overlay` runs anchor-to-anchor.
///
/// `upsert_edge` already rejects such an edge at insertion time; this
/// re-verifies the invariant for an overlay that arrived by another path,
/// chiefly a session file deserialized straight into a
/// [`TopologyOverlay`](crate::overlay::TopologyOverlay) without going
/// through `upsert_edge`.
///
/// # Errors
///
/// Returns [`GraphError::InvariantBroken`] if any anchor-to-anchor edge
/// is found.
pub fn check_no_anchor_cross_talk(overlay: &TopologyOverlay) -> Result<(), GraphError> {
    let clean = overlay.iter_edges(|_, _, _| true).all(|(src, tgt, _)| !(src.is_anchor() && tgt.is_anchor()));
    if clean {
        Ok(())
    } else {
        Err(GraphError::InvariantBroken {
            kind: InvariantKind::NoAnchorCrossTalk,
        })
    }
}

/// Check I5: every anchor's and concept's baseline activation lies in
/// `[0, 1]`.
///
/// Live spread activations are clamped every step by the dynamics
/// engine's own guard; this checks the persisted baselines instead,
/// which arrive from a seed document or a session reload and are never
/// routed through that guard.
///
/// # Errors
///
/// Returns [`GraphError::InvariantBroken`] if any baseline activation
/// falls outside `[0, 1]`.
pub fn check_activation_bounds(substrate: &GraphSubstrate) -> Result<(), GraphError> {
    let anchors_ok = substrate.anchors().all(|a| (0.0..=1.0).contains(&a.baseline_activation));
    let concepts_ok = substrate.concepts().all(|c| (0.0..=1.0).contains(&c.baseline_activation));
    if anchors_ok && concepts_ok {
        Ok(())
    } else {
        Err(GraphError::InvariantBroken {
            kind: InvariantKind::ActivationBounds,
        })
    }
}

/// Whether `anchor` has at least one concept in its reverse-reachable set
/// over positive-weight incoming edges.
pub fn is_anchor_reachable(overlay: &TopologyOverlay, anchor: NodeId) -> bool {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    seen.insert(anchor);
    queue.push_back(anchor);

    while let Some(node) = queue.pop_front() {
        for &pred in overlay.neighbors(node, Direction::Incoming) {
            let Some(edge) = overlay.get_edge(pred, node) else {
                continue;
            };
            if edge.weight <= 0.0 {
                continue;
            }
            if !pred.is_anchor() {
                return true;
            }
            if seen.insert(pred) {
                queue.push_back(pred);
            }
        }
    }
    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_types::{Archetype, VirtueAnchor, VirtueId};

    fn nineteen_anchors() -> Vec<VirtueAnchor> {
        (1..=19)
            .map(|n| VirtueAnchor {
                id: VirtueId::from_ordinal(n).unwrap(),
                name: format!("virtue-{n}"),
                tier: if n == 1 { Tier::Foundation } else { Tier::Aspirational },
                cluster: Archetype::Guardian,
                base_threshold: 0.7,
                baseline_activation: 0.3,
            })
            .collect()
    }

    #[test]
    fn anchor_set_shape_holds_for_nineteen_with_one_foundation() {
        let mut substrate = GraphSubstrate::new();
        substrate.install_anchors(nineteen_anchors()).unwrap();
        assert!(check_anchor_set_shape(&substrate).is_ok());
    }

    #[test]
    fn anchor_set_shape_fails_when_incomplete() {
        let mut substrate = GraphSubstrate::new();
        substrate
            .install_anchors(nineteen_anchors().into_iter().take(5).collect())
            .unwrap();
        assert!(check_anchor_set_shape(&substrate).is_err());
    }

    #[test]
    fn reachability_true_when_concept_feeds_anchor() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(kiln_types::ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(concept, anchor, 1.0).unwrap();
        assert!(is_anchor_reachable(&overlay, anchor));
    }

    #[test]
    fn reachability_false_when_isolated() {
        let overlay = TopologyOverlay::new();
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        assert!(!is_anchor_reachable(&overlay, anchor));
    }

    #[test]
    fn reachability_ignores_zero_weight_edges() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(kiln_types::ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(concept, anchor, 0.0).unwrap();
        assert!(!is_anchor_reachable(&overlay, anchor));
    }

    #[test]
    fn no_anchor_cross_talk_holds_for_concept_edges() {
        let mut overlay = TopologyOverlay::new();
        let concept = NodeId::Concept(kiln_types::ConceptId::new());
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(concept, anchor, 1.0).unwrap();
        assert!(check_no_anchor_cross_talk(&overlay).is_ok());
    }

    #[test]
    fn no_anchor_cross_talk_holds_for_an_empty_overlay() {
        let overlay = TopologyOverlay::new();
        assert!(check_no_anchor_cross_talk(&overlay).is_ok());
    }

    #[test]
    fn activation_bounds_holds_for_default_anchors() {
        let mut substrate = GraphSubstrate::new();
        substrate.install_anchors(nineteen_anchors()).unwrap();
        assert!(check_activation_bounds(&substrate).is_ok());
    }

    #[test]
    fn activation_bounds_catches_out_of_range_concept() {
        let mut substrate = GraphSubstrate::new();
        substrate.install_anchors(nineteen_anchors()).unwrap();
        substrate.create_concept("overdriven", 1.5);
        assert!(check_activation_bounds(&substrate).is_err());
    }
}
