//! Error types for the graph substrate and virtue registry.

use kiln_types::{NodeId, VirtueId};

/// The invariant (I1..I6) a breach corresponds to, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// I1: the anchor set must have cardinality 19 with exactly one
    /// Foundation virtue.
    AnchorSetShape,
    /// I2: no edge may run anchor-to-anchor, nor anchor-to-concept in the
    /// activation adjacency.
    NoAnchorCrossTalk,
    /// I3: every anchor must be reachable from some concept via positive
    /// weight edges.
    AnchorReachability,
    /// I4: edge weights must stay within `[0, 1]`.
    EdgeWeightBounds,
    /// I5: activation values must stay within `[0, 1]` on anchors and
    /// concepts.
    ActivationBounds,
}

impl core::fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::AnchorSetShape => "I1 anchor set shape",
            Self::NoAnchorCrossTalk => "I2 no anchor cross-talk",
            Self::AnchorReachability => "I3 anchor reachability",
            Self::EdgeWeightBounds => "I4 edge weight bounds",
            Self::ActivationBounds => "I5 activation bounds",
        };
        write!(f, "{label}")
    }
}

/// Errors raised by the graph substrate.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Code attempted to create, mutate, or remove an anchor outside of
    /// registry initialization.
    #[error("attempted to mutate an anchor: {anchor}")]
    AnchorMutation {
        /// The anchor that was targeted.
        anchor: VirtueId,
    },

    /// A node id was referenced that does not exist in the substrate or
    /// overlay.
    #[error("unknown node: {node}")]
    UnknownNode {
        /// The node id that was not found.
        node: NodeId,
    },

    /// The virtue registry was initialized twice.
    #[error("virtue registry already initialized")]
    DuplicateAnchor,

    /// A batch mutation left an invariant broken.
    #[error("invariant broken: {kind}")]
    InvariantBroken {
        /// Which invariant was violated.
        kind: InvariantKind,
    },

    /// An edge was rejected because it would cross anchor boundaries in a
    /// way invariant I2 forbids.
    #[error("edge {src} -> {tgt} violates I2: anchors may not source or receive cross-anchor activation")]
    AnchorCrossTalk {
        /// The rejected edge's source.
        src: NodeId,
        /// The rejected edge's target.
        tgt: NodeId,
    },

    /// An edge weight outside `[0, 1]` was supplied.
    #[error("edge weight {weight} out of bounds [0, 1]")]
    WeightOutOfBounds {
        /// The out-of-bounds weight that was supplied.
        weight: f64,
    },
}
