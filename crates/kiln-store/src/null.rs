//! An in-memory adapter with no network dependency, the default for
//! `kiln test`/`kiln spread`/`kiln kiln` runs with no `--store-url`.

use std::sync::Mutex;

use crate::adapter::{GraphStore, Row};
use crate::error::StoreError;

/// Records every call it receives without touching the network, so the
/// numeric core is fully exercisable and testable with nothing running.
#[derive(Debug, Default)]
pub struct NullStore {
    merged_nodes: Mutex<Vec<(String, String)>>,
    upserted_edges: Mutex<Vec<(String, String, String)>>,
}

impl NullStore {
    /// Construct an empty null store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `merge_node` calls observed so far.
    pub fn merged_node_count(&self) -> usize {
        self.merged_nodes.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Number of `upsert_edge` calls observed so far.
    pub fn upserted_edge_count(&self) -> usize {
        self.upserted_edges.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

impl GraphStore for NullStore {
    async fn create_index(&self, _label: &str, _property: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn merge_node(&self, label: &str, _id_property: &str, id_value: &str, _properties: &Row) -> Result<(), StoreError> {
        self.merged_nodes.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push((label.to_owned(), id_value.to_owned()));
        Ok(())
    }

    async fn upsert_edge(&self, src_id: &str, tgt_id: &str, agent_id: &str, _properties: &Row) -> Result<(), StoreError> {
        self.upserted_edges
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((src_id.to_owned(), tgt_id.to_owned(), agent_id.to_owned()));
        Ok(())
    }

    async fn query(&self, _cypher: &str, _params: &Row) -> Result<Vec<Row>, StoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merge_node_is_recorded_without_network() {
        let store = NullStore::new();
        store.merge_node("Agent", "id", "abc", &Row::new()).await.expect("null store never fails");
        assert_eq!(store.merged_node_count(), 1);
    }

    #[tokio::test]
    async fn upsert_edge_is_recorded_without_network() {
        let store = NullStore::new();
        store.upsert_edge("c1", "V02", "agent-1", &Row::new()).await.expect("null store never fails");
        assert_eq!(store.upserted_edge_count(), 1);
    }

    #[tokio::test]
    async fn query_returns_no_rows() {
        let store = NullStore::new();
        let rows = store.query("MATCH (n) RETURN n", &Row::new()).await.expect("null store never fails");
        assert!(rows.is_empty());
    }
}
