//! Error types for the Gestalt Analyzer.

/// Errors raised by [`crate::compute::compute_gestalt`] and the comparison
/// utilities.
#[derive(Debug, thiserror::Error)]
pub enum GestaltError {
    /// Two embeddings were compared or interpolated but had different
    /// dimensionality.
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Dimension of the left-hand embedding.
        left: usize,
        /// Dimension of the right-hand embedding.
        right: usize,
    },

    /// K-means was asked to cluster an empty embedding set.
    #[error("cannot cluster an empty set of embeddings")]
    EmptyInput,

    /// K-means was asked for more clusters than there are embeddings.
    #[error("requested {k} clusters but only {available} embeddings were given")]
    TooFewPoints {
        /// Requested cluster count.
        k: usize,
        /// Number of embeddings supplied.
        available: usize,
    },
}
