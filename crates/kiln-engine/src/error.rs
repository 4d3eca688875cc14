//! Error types for the Kiln evolutionary loop and the `Engine`
//! orchestration context.

use kiln_types::AgentId;

/// Errors raised while orchestrating a Kiln generation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The graph substrate or an overlay rejected an operation.
    #[error("graph fault: {0}")]
    Graph(#[from] kiln_graph::GraphError),

    /// The activation engine faulted while running or maintaining a
    /// trajectory.
    #[error("dynamics fault: {0}")]
    Dynamics(#[from] kiln_dynamics::DynamicsError),

    /// The coherence evaluator faulted.
    #[error("coherence fault: {0}")]
    Coherence(#[from] kiln_coherence::CoherenceError),

    /// The Mercy Machine faulted.
    #[error("mercy fault: {0}")]
    Mercy(#[from] kiln_mercy::MercyError),

    /// A crossover or mutation distribution could not be constructed from
    /// its parameters. Never expected in practice since the Kiln's
    /// distributions use fixed, valid parameters; surfaced rather than
    /// panicking if that ever changes.
    #[error("invalid variation distribution")]
    InvalidDistribution,

    /// A worker thread in the parallel evaluation fan-out panicked before
    /// returning its results.
    #[error("a worker thread panicked during parallel evaluation")]
    ThreadPanicked,

    /// An operation referenced an agent absent from the population.
    #[error("unknown agent in population: {agent_id}")]
    UnknownAgent {
        /// The agent id that was not found.
        agent_id: AgentId,
    },
}
