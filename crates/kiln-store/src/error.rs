//! Error types for the persistence adapter.

/// Errors raised by a [`crate::GraphStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying `FalkorDB`/Redis-protocol connection failed.
    #[error("graph store connection error: {0}")]
    Connection(#[from] fred::error::Error),

    /// A value returned by the store could not be deserialized into the
    /// expected shape.
    #[error("graph store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured store URL could not be parsed.
    #[error("invalid store url: {0}")]
    InvalidUrl(String),

    /// A query's result set did not have the expected shape.
    #[error("unexpected query result shape: {0}")]
    UnexpectedResult(String),
}
