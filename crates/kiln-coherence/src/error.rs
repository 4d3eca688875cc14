//! Error types for the coherence evaluator.

/// Errors raised while evaluating an agent's coherence.
#[derive(Debug, thiserror::Error)]
pub enum CoherenceError {
    /// The dynamics engine faulted while running a sampled stimulus.
    #[error("dynamics fault during coherence evaluation: {0}")]
    Dynamics(#[from] kiln_dynamics::DynamicsError),

    /// No concept in the substrate has at least one outgoing edge, so no
    /// stimulus sample can be drawn.
    #[error("no eligible stimulus concepts available for sampling")]
    NoEligibleStimuli,
}
