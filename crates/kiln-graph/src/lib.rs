//! Graph substrate and virtue registry (C1 + C2).
//!
//! This crate owns the shared node identity space (19 virtue anchors plus
//! mutable concepts) and the per-agent weighted topology overlay agents
//! are evaluated and evolved on. It enforces the four structural
//! invariants that hold regardless of which agent's overlay is in play:
//! anchor set shape (I1), no anchor cross-talk (I2), anchor reachability
//! (I3), and edge weight bounds (I4).

pub mod error;
pub mod invariants;
pub mod overlay;
pub mod registry;
pub mod substrate;

pub use error::{GraphError, InvariantKind};
pub use invariants::{check_anchor_reachability, check_anchor_set_shape, is_anchor_reachable};
pub use overlay::{TopologyOverlay, EDGE_REMOVAL_THRESHOLD};
pub use registry::{
    VirtueDefinition, VirtueRegistry, ARCHETYPE_BONUS, ASPIRATIONAL_THRESHOLD_MAX,
    ASPIRATIONAL_THRESHOLD_MIN, FOUNDATION_THRESHOLD,
};
pub use substrate::{GraphSubstrate, NodeInfo};
