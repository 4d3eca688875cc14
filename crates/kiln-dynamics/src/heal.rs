//! Self-healing: detect dead zones and re-wire them to a reachable anchor.
//!
//! A dead zone is a strongly connected component of concepts with no
//! outgoing edge reaching any anchor within three hops. Detection uses an
//! iterative (non-recursive) Tarjan SCC pass over the concept subgraph,
//! adapted from the ownership-cycle detector pattern used elsewhere in the
//! retrieval pack for labeled-graph cycle detection.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rand::Rng;
use rand::seq::IndexedRandom;

use kiln_graph::{GraphSubstrate, TopologyOverlay};
use kiln_types::{Direction, NodeId};

use crate::config::DynamicsConfig;
use crate::error::DynamicsError;

const HEAL_HOP_BOUND: u32 = 3;

/// Run one self-healing pass: find dead zones and wire each to a reachable
/// anchor outside its bound.
///
/// # Errors
///
/// Propagates [`DynamicsError::Graph`] if the repair edge is rejected by
/// the overlay (should not happen for a concept -> anchor edge).
pub fn apply(substrate: &GraphSubstrate, overlay: &mut TopologyOverlay, config: &DynamicsConfig, rng: &mut impl Rng) -> Result<(), DynamicsError> {
    let zones = dead_zones(substrate, overlay);

    for zone in zones {
        let reachable = reachable_anchors_within(overlay, &zone, HEAL_HOP_BOUND);
        let healable_anchors: Vec<_> = substrate.anchors().map(|a| a.id).filter(|v| !reachable.contains(v)).collect();
        let zone_members: Vec<NodeId> = zone.iter().copied().collect();
        let (Some(&source), Some(&target)) = (zone_members.choose(rng), healable_anchors.choose(rng)) else {
            continue;
        };
        overlay.upsert_edge(source, NodeId::Anchor(target), config.heal_edge_weight)?;
    }
    Ok(())
}

/// All concept-only strongly connected components with no anchor reachable
/// within `HEAL_HOP_BOUND` hops from any member.
fn dead_zones(substrate: &GraphSubstrate, overlay: &TopologyOverlay) -> Vec<BTreeSet<NodeId>> {
    let concepts: Vec<NodeId> = substrate.concept_ids().map(NodeId::Concept).collect();
    tarjan_sccs(overlay, &concepts)
        .into_iter()
        .filter(|zone| reachable_anchors_within(overlay, zone, HEAL_HOP_BOUND).is_empty())
        .collect()
}

fn reachable_anchors_within(overlay: &TopologyOverlay, zone: &BTreeSet<NodeId>, bound: u32) -> BTreeSet<kiln_types::VirtueId> {
    let mut found = BTreeSet::new();
    let mut visited: BTreeSet<NodeId> = zone.clone();
    let mut frontier: VecDeque<(NodeId, u32)> = zone.iter().map(|&n| (n, 0)).collect();

    while let Some((node, depth)) = frontier.pop_front() {
        if depth >= bound {
            continue;
        }
        for &next in overlay.neighbors(node, Direction::Outgoing) {
            if let NodeId::Anchor(v) = next {
                found.insert(v);
            }
            #[allow(clippy::arithmetic_side_effects)]
            let next_depth = depth + 1;
            if visited.insert(next) {
                frontier.push_back((next, next_depth));
            }
        }
    }
    found
}

/// Iterative Tarjan SCC over the concept-only subgraph reachable through
/// `nodes`. Singleton components with no self-loop are still returned --
/// an isolated concept is its own (trivially dead) zone.
fn tarjan_sccs(overlay: &TopologyOverlay, nodes: &[NodeId]) -> Vec<BTreeSet<NodeId>> {
    let mut index_counter: u32 = 0;
    let mut indices: BTreeMap<NodeId, u32> = BTreeMap::new();
    let mut lowlink: BTreeMap<NodeId, u32> = BTreeMap::new();
    let mut on_stack: BTreeSet<NodeId> = BTreeSet::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut sccs = Vec::new();

    for &start in nodes {
        if indices.contains_key(&start) {
            continue;
        }
        strong_connect(overlay, start, &mut index_counter, &mut indices, &mut lowlink, &mut on_stack, &mut stack, &mut sccs);
    }
    sccs
}

#[allow(clippy::arithmetic_side_effects)]
#[allow(clippy::too_many_arguments)]
fn strong_connect(
    overlay: &TopologyOverlay,
    root: NodeId,
    index_counter: &mut u32,
    indices: &mut BTreeMap<NodeId, u32>,
    lowlink: &mut BTreeMap<NodeId, u32>,
    on_stack: &mut BTreeSet<NodeId>,
    stack: &mut Vec<NodeId>,
    sccs: &mut Vec<BTreeSet<NodeId>>,
) {
    // Iterative DFS: explicit work-stack of (node, next child index to visit).
    let mut work: Vec<(NodeId, usize)> = vec![(root, 0)];
    indices.insert(root, *index_counter);
    lowlink.insert(root, *index_counter);
    *index_counter += 1;
    stack.push(root);
    on_stack.insert(root);

    while let Some(&(node, child_idx)) = work.last() {
        let children: Vec<NodeId> = overlay
            .neighbors(node, Direction::Outgoing)
            .iter()
            .copied()
            .filter(|n| matches!(n, NodeId::Concept(_)))
            .collect();

        let Some(child) = children.get(child_idx).copied() else {
            work.pop();
            if let Some(&(parent, _)) = work.last() {
                let node_low = lowlink.get(&node).copied().unwrap_or(0);
                if let Some(parent_low) = lowlink.get_mut(&parent) {
                    *parent_low = (*parent_low).min(node_low);
                }
            }

            if lowlink.get(&node).copied() == indices.get(&node).copied() {
                let mut component = BTreeSet::new();
                while let Some(member) = stack.pop() {
                    on_stack.remove(&member);
                    component.insert(member);
                    if member == node {
                        break;
                    }
                }
                sccs.push(component);
            }
            continue;
        };

        if let Some(top) = work.last_mut() {
            top.1 += 1;
        }

        if !indices.contains_key(&child) {
            indices.insert(child, *index_counter);
            lowlink.insert(child, *index_counter);
            *index_counter += 1;
            stack.push(child);
            on_stack.insert(child);
            work.push((child, 0));
        } else if on_stack.contains(&child) {
            let child_index = indices.get(&child).copied().unwrap_or(0);
            if let Some(node_low) = lowlink.get_mut(&node) {
                *node_low = (*node_low).min(child_index);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_graph::VirtueDefinition;
    use kiln_types::{Archetype, Tier, VirtueId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn registry_substrate() -> GraphSubstrate {
        let mut substrate = GraphSubstrate::new();
        let mut registry = kiln_graph::VirtueRegistry::new();
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
        substrate
    }

    #[test]
    fn isolated_concept_is_its_own_dead_zone_and_gets_healed() {
        let mut substrate = registry_substrate();
        let concept = substrate.create_concept("orphan", 0.1);
        let mut overlay = TopologyOverlay::new();
        let config = DynamicsConfig::default();
        let mut rng = StdRng::seed_from_u64(3);

        apply(&substrate, &mut overlay, &config, &mut rng).unwrap();

        assert!(overlay.has_outgoing(NodeId::Concept(concept)));
    }

    #[test]
    fn concept_already_near_an_anchor_is_not_healed_again() {
        let mut substrate = registry_substrate();
        let concept = substrate.create_concept("connected", 0.1);
        let mut overlay = TopologyOverlay::new();
        let anchor = NodeId::Anchor(VirtueId::from_ordinal(2).unwrap());
        overlay.upsert_edge(NodeId::Concept(concept), anchor, 0.5).unwrap();
        let config = DynamicsConfig::default();
        let mut rng = StdRng::seed_from_u64(3);

        apply(&substrate, &mut overlay, &config, &mut rng).unwrap();

        assert_eq!(overlay.edge_count(), 1);
    }
}
