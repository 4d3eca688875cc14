//! The narrow persistence adapter interface: every engine concern that
//! needs durable state goes through these four verbs. Any store meeting
//! this contract is acceptable; the reference target is `FalkorDB`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::StoreError;

/// One row of a `query` result: column name to value.
pub type Row = BTreeMap<String, Value>;

/// The persistence adapter every external graph store must implement.
///
/// Labels, relationship types, and indexes follow the persisted state
/// layout exactly: labels `VirtueAnchor, Concept, Agent, Trajectory,
/// Warning, Lesson, Pathway`; relationship type `CONNECTS {weight,
/// use_count, last_used, agent_id}` keyed by `(src, tgt, agent_id)` so
/// overlays for every agent coexist in one store.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
    /// Create an index on `label(property)`. Idempotent: creating an
    /// index that already exists is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store rejects the
    /// operation.
    async fn create_index(&self, label: &str, property: &str) -> Result<(), StoreError>;

    /// Merge (create-or-update) a labeled node identified by `id_property`
    /// with the given property map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store rejects the
    /// operation.
    async fn merge_node(&self, label: &str, id_property: &str, id_value: &str, properties: &Row) -> Result<(), StoreError>;

    /// Upsert a `CONNECTS` relationship between two nodes, keyed by
    /// `(src, tgt, agent_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store rejects the
    /// operation.
    async fn upsert_edge(&self, src_id: &str, tgt_id: &str, agent_id: &str, properties: &Row) -> Result<(), StoreError>;

    /// Run an arbitrary Cypher-like query with bound parameters, returning
    /// its result rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails or the store connection
    /// is unavailable.
    async fn query(&self, cypher: &str, params: &Row) -> Result<Vec<Row>, StoreError>;
}

/// Retry an adapter operation with exponential backoff, at most 3
/// attempts, before giving up.
///
/// # Errors
///
/// Returns the last attempt's error once the retry budget is exhausted.
pub async fn retry_with_backoff<T, F, Fut>(mut attempt: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, StoreError>>,
{
    const MAX_ATTEMPTS: u32 = 3;
    let mut last_err = match attempt().await {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    let mut retry_number: u32 = 0;
    while retry_number < MAX_ATTEMPTS.saturating_sub(1) {
        tracing::warn!(attempt = retry_number, error = %last_err, "graph store operation failed, retrying");
        let backoff_ms = 50u64.saturating_mul(1u64 << retry_number);
        tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
        last_err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        retry_number = retry_number.saturating_add(1);
    }
    Err(last_err)
}
