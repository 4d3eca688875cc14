//! The external persistence sync path.
//!
//! `Session` is this binary's real source of truth (`session.rs`); this
//! module is the parallel durable write path, so anchors, concepts,
//! agents, and overlay edges also land in an external graph store across
//! `init`/`spawn`/`kiln` runs. A thin enum picks the real backend when a
//! connection string is configured and an in-memory stand-in otherwise,
//! so the same call sites work with nothing running.

use kiln_store::{FalkorStore, GraphStore, NullStore, Row, StoreError};
use kiln_types::{Agent, Concept, Edge, NodeId, VirtueAnchor};
use serde_json::Value;

/// The persistence handle a command holds for the lifetime of one
/// invocation: a real `FalkorDB` connection when `--store-url` (or
/// `SOUL_KILN_STORE_URL`) is set, otherwise an in-memory stand-in that
/// never fails and never reaches the network.
pub enum Store {
    /// A live `FalkorDB` connection.
    Falkor(FalkorStore),
    /// The offline default.
    Null(NullStore),
}

impl Store {
    /// Connect to `url` if given, falling back to [`NullStore`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `url` is set but the connection fails.
    pub async fn connect(url: Option<&str>) -> Result<Self, StoreError> {
        match url {
            Some(url) => Ok(Self::Falkor(FalkorStore::connect(url, "soul-kiln").await?)),
            None => Ok(Self::Null(NullStore::new())),
        }
    }
}

impl GraphStore for Store {
    async fn create_index(&self, label: &str, property: &str) -> Result<(), StoreError> {
        match self {
            Self::Falkor(store) => store.create_index(label, property).await,
            Self::Null(store) => store.create_index(label, property).await,
        }
    }

    async fn merge_node(&self, label: &str, id_property: &str, id_value: &str, properties: &Row) -> Result<(), StoreError> {
        match self {
            Self::Falkor(store) => store.merge_node(label, id_property, id_value, properties).await,
            Self::Null(store) => store.merge_node(label, id_property, id_value, properties).await,
        }
    }

    async fn upsert_edge(&self, src_id: &str, tgt_id: &str, agent_id: &str, properties: &Row) -> Result<(), StoreError> {
        match self {
            Self::Falkor(store) => store.upsert_edge(src_id, tgt_id, agent_id, properties).await,
            Self::Null(store) => store.upsert_edge(src_id, tgt_id, agent_id, properties).await,
        }
    }

    async fn query(&self, cypher: &str, params: &Row) -> Result<Vec<Row>, StoreError> {
        match self {
            Self::Falkor(store) => store.query(cypher, params).await,
            Self::Null(store) => store.query(cypher, params).await,
        }
    }
}

/// Create the indexes every command relies on existing. Called once by
/// `init`, idempotently.
///
/// # Errors
///
/// Returns [`StoreError`] if the store rejects index creation.
pub async fn ensure_indexes(store: &Store) -> Result<(), StoreError> {
    for (label, property) in [("VirtueAnchor", "id"), ("Concept", "id"), ("Agent", "id")] {
        kiln_store::retry_with_backoff(|| store.create_index(label, property)).await?;
    }
    Ok(())
}

/// Merge one anchor node.
///
/// # Errors
///
/// Returns [`StoreError`] after the retry budget is exhausted.
pub async fn write_anchor(store: &Store, anchor: &VirtueAnchor) -> Result<(), StoreError> {
    let mut properties = Row::new();
    properties.insert("name".to_owned(), Value::String(anchor.name.clone()));
    properties.insert("tier".to_owned(), Value::String(format!("{:?}", anchor.tier)));
    properties.insert("cluster".to_owned(), Value::String(format!("{:?}", anchor.cluster)));
    let id_value = anchor.id.to_string();
    kiln_store::retry_with_backoff(|| store.merge_node("VirtueAnchor", "id", &id_value, &properties)).await
}

/// Merge one concept node.
///
/// # Errors
///
/// Returns [`StoreError`] after the retry budget is exhausted.
pub async fn write_concept(store: &Store, concept: &Concept) -> Result<(), StoreError> {
    let mut properties = Row::new();
    properties.insert("name".to_owned(), Value::String(concept.name.clone()));
    let id_value = concept.id.to_string();
    kiln_store::retry_with_backoff(|| store.merge_node("Concept", "id", &id_value, &properties)).await
}

/// Merge one agent node.
///
/// # Errors
///
/// Returns [`StoreError`] after the retry budget is exhausted.
pub async fn write_agent(store: &Store, agent: &Agent) -> Result<(), StoreError> {
    let mut properties = Row::new();
    properties.insert("archetype".to_owned(), Value::String(format!("{:?}", agent.archetype)));
    properties.insert("generation".to_owned(), Value::from(agent.generation));
    properties.insert("status".to_owned(), Value::String(format!("{:?}", agent.status)));
    let id_value = agent.id.to_string();
    kiln_store::retry_with_backoff(|| store.merge_node("Agent", "id", &id_value, &properties)).await
}

/// Upsert one overlay edge, keyed by `(src, tgt, agent_id)`.
///
/// # Errors
///
/// Returns [`StoreError`] after the retry budget is exhausted.
pub async fn write_edge(store: &Store, src: NodeId, tgt: NodeId, agent_id: &str, edge: &Edge) -> Result<(), StoreError> {
    let mut properties = Row::new();
    properties.insert("weight".to_owned(), Value::from(edge.weight));
    properties.insert("use_count".to_owned(), Value::from(edge.use_count));
    let src_value = src.to_string();
    let tgt_value = tgt.to_string();
    kiln_store::retry_with_backoff(|| store.upsert_edge(&src_value, &tgt_value, agent_id, &properties)).await
}
