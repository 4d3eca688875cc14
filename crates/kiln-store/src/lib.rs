//! Persistence adapter for the Soul Kiln alignment engine.
//!
//! The core is a numeric/structural engine, not a database client: this
//! crate exposes a narrow four-verb contract (`create_index`,
//! `merge_node`, `upsert_edge`, `query`) and two
//! implementations -- [`FalkorStore`] for a real `FalkorDB`-compatible
//! backend, and [`NullStore`] for tests and offline `kiln-cli` runs.

pub mod adapter;
pub mod error;
pub mod falkordb;
pub mod null;

pub use adapter::{retry_with_backoff, GraphStore, Row};
pub use error::StoreError;
pub use falkordb::FalkorStore;
pub use null::NullStore;
