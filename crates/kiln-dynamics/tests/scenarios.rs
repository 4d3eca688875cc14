//! End-to-end acceptance scenarios for the activation engine, exercised
//! against its public API over a minimal 19-anchor substrate.

use kiln_dynamics::{run_trajectory, DynamicsConfig};
use kiln_graph::{GraphSubstrate, TopologyOverlay, VirtueDefinition, VirtueRegistry};
use kiln_types::{AgentId, Archetype, NodeId, Tier, VirtueId};

fn registry_with_anchors() -> (GraphSubstrate, VirtueRegistry) {
    let mut substrate = GraphSubstrate::new();
    let mut registry = VirtueRegistry::new();
    let defs: Vec<VirtueDefinition> = (1..=19)
        .map(|n| VirtueDefinition {
            id: VirtueId::from_ordinal(n).expect("1..=19 are valid ordinals"),
            name: format!("virtue-{n}"),
            tier: if n == 1 { Tier::Foundation } else { Tier::Aspirational },
            cluster: Archetype::Guardian,
            base_threshold: 0.5,
            baseline_activation: 0.1,
        })
        .collect();
    registry.initialize(&mut substrate, defs).expect("fresh registry accepts 19 definitions");
    (substrate, registry)
}

/// S1: a single concept with a weight-1.0 edge straight to an anchor is
/// captured by that anchor within the minimum dwell window, and its
/// canonical path is exactly the two nodes it crossed.
#[test]
fn canonical_single_edge_capture() {
    let (mut substrate, registry) = registry_with_anchors();
    let mut overlay = TopologyOverlay::new();
    let concept_id = substrate.create_concept("c1", 0.1);
    let c1 = NodeId::Concept(concept_id);
    let v02 = VirtueId::from_ordinal(2).expect("2 is a valid ordinal");
    let anchor = NodeId::Anchor(v02);
    overlay.upsert_edge(c1, anchor, 1.0).expect("fresh overlay accepts a new edge");

    let config = DynamicsConfig::default();
    let outcome = run_trajectory(&substrate, &overlay, &registry, &config, AgentId::new(), Archetype::Guardian, 5, c1)
        .expect("c1 is a node in substrate");

    assert!(!outcome.trajectory.escaped());
    assert_eq!(outcome.trajectory.captured_by, Some(v02));
    let step = outcome.trajectory.capture_step.expect("captured trajectories record a step");
    assert!((1..=3).contains(&step), "capture_step {step} outside [1, 3]");
    assert_eq!(outcome.trajectory.path, vec![c1, anchor]);
}
