//! Error types for the Mercy Machine.

use kiln_types::AgentId;

/// Errors raised by the Mercy Machine.
#[derive(Debug, thiserror::Error)]
pub enum MercyError {
    /// An operation referenced an agent with no mercy record.
    #[error("no mercy record for agent {agent_id}")]
    UnknownAgent {
        /// The agent that was referenced.
        agent_id: AgentId,
    },

    /// An operation was attempted against an agent already `Dissolved`.
    #[error("agent {agent_id} is already dissolved")]
    AlreadyDissolved {
        /// The agent that was referenced.
        agent_id: AgentId,
    },

    /// Invariant I6 (the warning cap implies at most one pending
    /// dissolution) was broken for some agent's record.
    #[error("agent {agent_id}: {detail}")]
    InvariantBroken {
        /// The agent whose record violated the invariant.
        agent_id: AgentId,
        /// A human-readable description of the violation.
        detail: String,
    },
}
