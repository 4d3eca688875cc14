//! Shared type definitions for the Soul Kiln alignment engine.
//!
//! This crate is the single source of truth for the entities, ids, and
//! enumerations every other crate in the workspace depends on. It defines
//! no behavior of its own beyond small, total helper methods on the types
//! themselves.
//!
//! # Modules
//!
//! - [`ids`] -- type-safe identifier wrappers for every entity
//! - [`enums`] -- enumeration types (tiers, archetypes, states, verdicts)
//! - [`structs`] -- core entity structs (anchors, concepts, agents,
//!   trajectories, warnings, lessons, pathways, reports)

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{
    Archetype, AgentStatus, CoherenceVerdict, Direction, HarmIntent, HarmRecommendation,
    LessonKind, MercyState, Tier, WarningSeverity,
};
pub use ids::{
    AgentId, ConceptId, LessonId, NodeId, PathwayId, TrajectoryId, VirtueId, WarningId,
};
pub use structs::{
    Agent, CoherenceReport, Concept, Edge, GenerationReport, Gestalt, HarmVerdict, Lesson,
    Pathway, Trajectory, VirtueAnchor, Warning,
};
