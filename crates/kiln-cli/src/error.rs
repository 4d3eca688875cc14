//! Command-surface errors and the exit-code mapping `main` uses.

use kiln_types::AgentId;

/// Errors raised while dispatching a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A command that requires an initialized session was run before
    /// `init`, or `init` was run twice without `--force`.
    #[error("{0}")]
    User(String),

    /// `health` found at least one invariant violated.
    #[error("invariant check failed: {0}")]
    InvariantFailed(String),

    /// An operation referenced an agent not present in the session.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// The session file could not be read or written.
    #[error("session I/O error: {0}")]
    SessionIo(#[from] std::io::Error),

    /// The session file's contents could not be parsed.
    #[error("session file is corrupt: {0}")]
    SessionFormat(#[from] serde_json::Error),

    /// The configuration document could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] kiln_engine::ConfigError),

    /// The seed virtue document could not be loaded.
    #[error("seed data error: {0}")]
    Seed(#[from] crate::seed::SeedError),

    /// A graph substrate or overlay operation faulted.
    #[error(transparent)]
    Graph(#[from] kiln_graph::GraphError),

    /// The activation engine faulted.
    #[error(transparent)]
    Dynamics(#[from] kiln_dynamics::DynamicsError),

    /// The coherence evaluator faulted.
    #[error(transparent)]
    Coherence(#[from] kiln_coherence::CoherenceError),

    /// The Kiln evolutionary loop faulted.
    #[error(transparent)]
    Engine(#[from] kiln_engine::EngineError),

    /// The persistence adapter faulted.
    #[error(transparent)]
    Store(#[from] kiln_store::StoreError),
}

impl CliError {
    /// The process exit code this failure maps to: `1` for a
    /// `UserError`-class failure, `2` for a `health` invariant failure,
    /// `1` for every other propagated fault.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvariantFailed(_) => 2,
            _ => 1,
        }
    }
}
