//! Activation spread and capture detection: the numeric core of the
//! activation engine.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use kiln_graph::{GraphSubstrate, TopologyOverlay, VirtueRegistry};
use kiln_types::{AgentId, Archetype, NodeId, Trajectory, TrajectoryId, VirtueId};

use crate::config::DynamicsConfig;
use crate::error::DynamicsError;

/// The outcome of one `run_trajectory` call: the trajectory record plus
/// the rolling activation windows needed for the Hebbian update.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The trajectory produced by the run.
    pub trajectory: Trajectory,
    /// Per-node activation history over the dwell window ending at the
    /// step the run stopped on, restricted to nodes that appear in
    /// `trajectory.path`.
    pub dwell_history: BTreeMap<NodeId, Vec<f64>>,
}

/// Clamp a possibly-non-finite activation value into `[0, 1]`, logging the
/// fault.
fn guard(node: NodeId, value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        tracing::warn!(?node, value, "activation diverged to NaN/Inf, clamping");
        0.0
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// The set of nodes a spread run needs to track: every anchor plus every
/// node touched by an edge in `overlay`, plus the stimulus itself.
fn node_universe(substrate: &GraphSubstrate, overlay: &TopologyOverlay, stimulus: NodeId) -> BTreeSet<NodeId> {
    let mut nodes: BTreeSet<NodeId> = substrate.anchors().map(|a| NodeId::Anchor(a.id)).collect();
    nodes.insert(stimulus);
    for (src, tgt, _) in overlay.iter_edges(|_, _, _| true) {
        nodes.insert(src);
        nodes.insert(tgt);
    }
    nodes
}

/// Run one stimulus-to-capture (or escape) trajectory.
///
/// # Errors
///
/// Returns [`DynamicsError::Graph`] if `stimulus` is not a node in
/// `substrate`.
// Activation sums are plain floats in [0, 1]; clamped by `guard` every
// step, so overflow is not a concern but clippy cannot see that.
#[allow(clippy::arithmetic_side_effects)]
#[allow(clippy::too_many_arguments)]
pub fn run_trajectory(
    substrate: &GraphSubstrate,
    overlay: &TopologyOverlay,
    registry: &VirtueRegistry,
    config: &DynamicsConfig,
    agent_id: AgentId,
    archetype: Archetype,
    generation: u32,
    stimulus: NodeId,
) -> Result<RunOutcome, DynamicsError> {
    substrate.get_node(stimulus)?;

    if !overlay.has_outgoing(stimulus) {
        let trajectory = Trajectory {
            id: TrajectoryId::new(),
            agent_id,
            stimulus_id: stimulus,
            path: vec![stimulus],
            captured_by: None,
            capture_step: None,
            length: 0,
        };
        return Ok(RunOutcome {
            trajectory,
            dwell_history: BTreeMap::new(),
        });
    }

    let universe = node_universe(substrate, overlay, stimulus);
    let thresholds: BTreeMap<VirtueId, f64> = substrate
        .anchors()
        .map(|a| (a.id, registry.threshold(a.id, archetype, generation)))
        .collect();

    let mut x: BTreeMap<NodeId, f64> = universe
        .iter()
        .map(|&n| {
            let baseline = substrate.get_node(n).map(|info| info.baseline_activation).unwrap_or(0.0);
            (n, if n == stimulus { 1.0 } else { baseline })
        })
        .collect();

    let window = usize::try_from(config.min_capture_steps).unwrap_or(3).max(1);
    let mut dwell: BTreeMap<NodeId, VecDeque<f64>> = universe.iter().map(|&n| (n, VecDeque::with_capacity(window))).collect();
    let mut consecutive: BTreeMap<VirtueId, u32> = thresholds.keys().map(|&v| (v, 0)).collect();

    let mut seen = BTreeSet::new();
    let mut path = Vec::new();
    record_crossing(stimulus, x[&stimulus], config.recording_threshold, &mut seen, &mut path);

    let mut capture: Option<(VirtueId, u32)> = None;
    let mut length = 0u32;

    for step in 1..=config.max_steps {
        let mut next = BTreeMap::new();
        for &node in &universe {
            let node_info = substrate.get_node(node)?;
            let incoming_sum: f64 = overlay
                .neighbors(node, kiln_types::Direction::Incoming)
                .iter()
                .filter(|src| !src.is_anchor())
                .filter_map(|&src| {
                    overlay
                        .get_edge(src, node)
                        .map(|edge| edge.weight * (x.get(&src).copied().unwrap_or(0.0) * config.spread_dampening).tanh())
                })
                .sum();
            let pre = incoming_sum + node_info.baseline_activation;
            next.insert(node, guard(node, sigmoid(pre)));
        }
        x = next;
        length = step;

        for (&node, value) in &x {
            let buf = dwell.entry(node).or_insert_with(|| VecDeque::with_capacity(window));
            if buf.len() == window {
                buf.pop_front();
            }
            buf.push_back(*value);
            record_crossing(node, *value, config.recording_threshold, &mut seen, &mut path);
        }

        for (&virtue, threshold) in &thresholds {
            let activation = x.get(&NodeId::Anchor(virtue)).copied().unwrap_or(0.0);
            let count = consecutive.entry(virtue).or_insert(0);
            if activation >= *threshold {
                *count += 1;
            } else {
                *count = 0;
            }
        }

        let candidates: Vec<VirtueId> = consecutive
            .iter()
            .filter(|&(_, &count)| count >= config.min_capture_steps)
            .map(|(&v, _)| v)
            .collect();

        let best = candidates.iter().max_by(|&&a, &&b| {
            let mean_a = dwell_mean(&dwell, NodeId::Anchor(a));
            let mean_b = dwell_mean(&dwell, NodeId::Anchor(b));
            mean_a
                .partial_cmp(&mean_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(&a.0))
        });
        if let Some(&winner) = best {
            capture = Some((winner, step));
            break;
        }
    }

    if let Some((anchor, _)) = capture {
        truncate_path_at_anchor(&mut path, anchor);
    }

    let dwell_history: BTreeMap<NodeId, Vec<f64>> = path
        .iter()
        .filter_map(|&node| dwell.get(&node).map(|buf| (node, buf.iter().copied().collect())))
        .collect();

    let trajectory = Trajectory {
        id: TrajectoryId::new(),
        agent_id,
        stimulus_id: stimulus,
        path,
        captured_by: capture.map(|(v, _)| v),
        capture_step: capture.map(|(_, s)| s),
        length,
    };

    Ok(RunOutcome { trajectory, dwell_history })
}

fn record_crossing(node: NodeId, value: f64, threshold: f64, seen: &mut BTreeSet<NodeId>, path: &mut Vec<NodeId>) {
    if value >= threshold && seen.insert(node) {
        path.push(node);
    }
}

#[allow(clippy::arithmetic_side_effects)]
fn dwell_mean(dwell: &BTreeMap<NodeId, VecDeque<f64>>, node: NodeId) -> f64 {
    dwell.get(&node).filter(|buf| !buf.is_empty()).map_or(0.0, |buf| {
        #[allow(clippy::cast_precision_loss)]
        let len_f64 = buf.len() as f64;
        buf.iter().sum::<f64>() / len_f64
    })
}

#[allow(clippy::arithmetic_side_effects)]
fn truncate_path_at_anchor(path: &mut Vec<NodeId>, anchor: VirtueId) {
    if let Some(idx) = path.iter().position(|&n| n == NodeId::Anchor(anchor)) {
        path.truncate(idx + 1);
    }
}
