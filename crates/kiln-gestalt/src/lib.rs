//! Gestalt Analyzer (C8): derives an agent's behavioral tendencies,
//! archetype, and a comparable embedding from its graph state and
//! recent trajectories.

pub mod archetype;
pub mod compute;
pub mod config;
pub mod embedding;
pub mod error;
pub mod interpolate;
pub mod kmeans;
pub mod relation;
pub mod signature;
pub mod tendency;

pub use archetype::{archetype_one_hot, cluster_affinities, derive_archetype, ARCHETYPES};
pub use compute::compute_gestalt;
pub use config::{GestaltConfig, TendencyDefinition, ARCHETYPE_MARGIN, EMBEDDING_DIM, RELATION_STATS_DIM, TENDENCY_COUNT};
pub use embedding::{build_embedding, cosine_similarity};
pub use error::GestaltError;
pub use interpolate::interpolate;
pub use kmeans::{k_means, KMeansResult};
pub use relation::relation_stats;
pub use signature::character_signature;
pub use tendency::score_tendencies;
