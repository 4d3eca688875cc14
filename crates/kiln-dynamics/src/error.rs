//! Error types for the activation engine.

use kiln_types::NodeId;

/// Errors raised while running or maintaining an agent's activation
/// dynamics.
#[derive(Debug, thiserror::Error)]
pub enum DynamicsError {
    /// The graph substrate or overlay rejected an operation this pass
    /// attempted: an unknown node, or an invariant broken by decay,
    /// perturbation, or healing. Fatal: the caller should quarantine the
    /// agent.
    #[error("graph fault during dynamics pass: {0}")]
    Graph(#[from] kiln_graph::GraphError),

    /// A sum diverged to NaN or infinity during a spread step. Recovered
    /// locally by clamping; surfaced so the caller can log it.
    #[error("numeric fault at node {node} during spread")]
    NumericFault {
        /// The node whose activation diverged.
        node: NodeId,
    },
}
