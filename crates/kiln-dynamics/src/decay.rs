//! Global edge-weight decay, run at a fixed maintenance cadence.

use chrono::{DateTime, Duration, Utc};

use kiln_graph::{check_anchor_reachability, GraphSubstrate, TopologyOverlay};

use crate::config::DynamicsConfig;
use crate::error::DynamicsError;

/// Apply one decay pass to every edge in `overlay`.
///
/// Edges used within the last `unit` are exempt. An edge decaying below
/// `config.edge_removal_threshold` is removed, unless removal would leave
/// an anchor unreachable (I3), in which case it is clamped to the
/// threshold instead of removed.
///
/// # Errors
///
/// This pass never itself breaks I3 (it repairs violations it would
/// otherwise cause), but propagates [`DynamicsError::Graph`] from the
/// underlying overlay operations.
pub fn apply(overlay: &mut TopologyOverlay, substrate: &GraphSubstrate, config: &DynamicsConfig, now: DateTime<Utc>, unit: Duration) -> Result<(), DynamicsError> {
    let candidates: Vec<_> = overlay
        .iter_edges(|_, _, edge| edge.last_used.is_none_or(|last| now - last >= unit))
        .map(|(src, tgt, _)| (src, tgt))
        .collect();

    for (src, tgt) in candidates {
        let Some(edge) = overlay.get_edge_mut(src, tgt) else {
            continue;
        };
        #[allow(clippy::arithmetic_side_effects)]
        {
            edge.weight *= config.decay_constant;
        }
        let weight = edge.weight;

        if weight < config.edge_removal_threshold {
            let Some(removed) = overlay.remove_edge(src, tgt) else {
                continue;
            };
            if check_anchor_reachability(substrate, overlay).is_err() {
                let mut restored = removed;
                restored.weight = config.edge_removal_threshold;
                overlay.upsert_edge(src, tgt, restored.weight)?;
                if let Some(edge) = overlay.get_edge_mut(src, tgt) {
                    edge.use_count = restored.use_count;
                    edge.last_used = restored.last_used;
                }
            }
        }
    }

    Ok(())
}
