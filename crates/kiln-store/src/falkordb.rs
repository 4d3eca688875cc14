//! `FalkorDB` (Redis-protocol graph database) adapter.
//!
//! A `fred::prelude::Client` connection with typed wrapper methods over
//! `FalkorDB`'s `GRAPH.QUERY` command. Every adapter verb is built from
//! one Cypher template and issued as a single `GRAPH.QUERY` call against
//! the configured graph name.

use std::collections::BTreeMap;

use fred::prelude::*;
use fred::types::CustomCommand;
use serde_json::Value;

use crate::adapter::{GraphStore, Row};
use crate::error::StoreError;

/// Connection handle to a `FalkorDB` instance, scoped to one graph name.
#[derive(Clone)]
pub struct FalkorStore {
    client: Client,
    graph_name: String,
}

impl FalkorStore {
    /// Connect to `FalkorDB` at the given Redis-protocol URL, scoped to
    /// `graph_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] if `url` cannot be parsed, or
    /// [`StoreError::Connection`] if the connection fails.
    pub async fn connect(url: &str, graph_name: impl Into<String>) -> Result<Self, StoreError> {
        let config = Config::from_url(url).map_err(|_| StoreError::InvalidUrl(url.to_owned()))?;
        let client = Builder::from_config(config).build()?;
        client.init().await?;
        let graph_name = graph_name.into();
        tracing::info!(%graph_name, "connected to FalkorDB");
        Ok(Self { client, graph_name })
    }

    /// Issue one `GRAPH.QUERY` call, returning the raw `[header, rows,
    /// statistics]` reply `FalkorDB` sends back for every query.
    async fn graph_query(&self, cypher: &str, params: &Row) -> Result<Vec<Vec<String>>, StoreError> {
        let params_preamble = cypher_params_preamble(params);
        let full_query = if params_preamble.is_empty() { cypher.to_owned() } else { format!("CYPHER {params_preamble} {cypher}") };

        let command = CustomCommand::new("GRAPH.QUERY", None, false);
        let reply: Vec<Vec<String>> = self.client.custom(command, vec![self.graph_name.clone(), full_query]).await?;
        Ok(reply)
    }
}

/// Build a Cypher parameter preamble (`CYPHER a=1 b='x'`) from a property
/// row. `FalkorDB` takes bound parameters this way rather than via a
/// separate wire field.
fn cypher_params_preamble(params: &Row) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", value_literal(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn value_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_literal_escapes_single_quotes() {
        assert_eq!(value_literal(&Value::String("o'brien".to_owned())), "'o\\'brien'");
    }

    #[test]
    fn value_literal_escapes_a_trailing_backslash_before_the_closing_quote() {
        let literal = value_literal(&Value::String("foo\\".to_owned()));
        assert_eq!(literal, "'foo\\\\'");
        assert!(literal.ends_with("\\\\'"));
    }

    #[test]
    fn value_literal_passes_through_null_and_numbers() {
        assert_eq!(value_literal(&Value::Null), "null");
        assert_eq!(value_literal(&Value::from(42)), "42");
    }
}

impl GraphStore for FalkorStore {
    async fn create_index(&self, label: &str, property: &str) -> Result<(), StoreError> {
        let cypher = format!("CREATE INDEX FOR (n:{label}) ON (n.{property})");
        self.graph_query(&cypher, &Row::new()).await?;
        Ok(())
    }

    async fn merge_node(&self, label: &str, id_property: &str, id_value: &str, properties: &Row) -> Result<(), StoreError> {
        let mut params: Row = BTreeMap::new();
        params.insert(id_property.to_owned(), Value::String(id_value.to_owned()));
        for (key, value) in properties {
            params.insert(key.clone(), value.clone());
        }
        let sets = properties.keys().map(|key| format!("n.{key} = ${key}")).collect::<Vec<_>>().join(", ");
        let cypher = if sets.is_empty() {
            format!("MERGE (n:{label} {{{id_property}: ${id_property}}})")
        } else {
            format!("MERGE (n:{label} {{{id_property}: ${id_property}}}) SET {sets}")
        };
        self.graph_query(&cypher, &params).await?;
        Ok(())
    }

    async fn upsert_edge(&self, src_id: &str, tgt_id: &str, agent_id: &str, properties: &Row) -> Result<(), StoreError> {
        let mut params: Row = BTreeMap::new();
        params.insert("src".to_owned(), Value::String(src_id.to_owned()));
        params.insert("tgt".to_owned(), Value::String(tgt_id.to_owned()));
        params.insert("agent_id".to_owned(), Value::String(agent_id.to_owned()));
        for (key, value) in properties {
            params.insert(key.clone(), value.clone());
        }
        let sets = properties.keys().map(|key| format!("r.{key} = ${key}")).collect::<Vec<_>>().join(", ");
        let set_clause = if sets.is_empty() { String::new() } else { format!(" SET {sets}") };
        let cypher = format!("MATCH (a {{id: $src}}), (b {{id: $tgt}}) MERGE (a)-[r:CONNECTS {{agent_id: $agent_id}}]->(b){set_clause}");
        self.graph_query(&cypher, &params).await?;
        Ok(())
    }

    async fn query(&self, cypher: &str, params: &Row) -> Result<Vec<Row>, StoreError> {
        let raw_rows = self.graph_query(cypher, params).await?;
        let rows = raw_rows
            .into_iter()
            .map(|columns| columns.into_iter().enumerate().map(|(i, cell)| (format!("col_{i}"), Value::String(cell))).collect())
            .collect();
        Ok(rows)
    }
}
