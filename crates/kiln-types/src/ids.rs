//! Type-safe identifier wrappers.
//!
//! Every entity in the simulation has a strongly-typed id so the compiler
//! rejects mixing, say, a [`WarningId`] where a [`LessonId`] is expected.
//! Entities whose creation order matters for database indexing (agents,
//! trajectories, warnings, lessons) use UUID v7; the virtue anchors and
//! concepts use plain v4, since anchors are assigned identity once at
//! `init` and concepts carry no temporal ordering requirement.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with the standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a mutable concept node.
    ConceptId
}

define_id! {
    /// Unique identifier for an agent (a candidate topology).
    AgentId
}

define_id! {
    /// Unique identifier for a recorded trajectory.
    TrajectoryId
}

define_id! {
    /// Unique identifier for an active or expired warning.
    WarningId
}

define_id! {
    /// Unique identifier for a lesson recorded in the Knowledge Pool.
    LessonId
}

define_id! {
    /// Unique identifier for a pathway recorded in the Knowledge Pool.
    PathwayId
}

/// Identifier for one of the 19 fixed virtue anchors (`V01`..`V19`).
///
/// Unlike the other ids this is not a UUID: anchors are assigned a stable
/// small ordinal once at `init`, and that ordinal is the canonical key used
/// in thresholds, clusters, and capture statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VirtueId(pub u8);

impl VirtueId {
    /// Total number of virtue anchors (fixed by invariant I1).
    pub const COUNT: u8 = 19;

    /// The single Foundation virtue's id, `V01`.
    pub const FOUNDATION: Self = Self(1);

    /// Construct a virtue id from its 1-based ordinal.
    ///
    /// Returns `None` if `ordinal` is outside `1..=19`.
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        if ordinal >= 1 && ordinal <= Self::COUNT {
            Some(Self(ordinal))
        } else {
            None
        }
    }

    /// Return the 1-based ordinal.
    pub const fn ordinal(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for VirtueId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "V{:02}", self.0)
    }
}

/// A node in the graph substrate: either a fixed virtue anchor or a mutable
/// concept.
///
/// This is the type activation dynamics, capture detection, and path
/// recording all operate over. Anchors and concepts share no id space, so
/// the sum type is the only way to index both with one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// A fixed virtue anchor.
    Anchor(VirtueId),
    /// A mutable concept node.
    Concept(ConceptId),
}

impl NodeId {
    /// Return the anchor id if this node is an anchor.
    pub const fn as_anchor(self) -> Option<VirtueId> {
        match self {
            Self::Anchor(v) => Some(v),
            Self::Concept(_) => None,
        }
    }

    /// Whether this node is an anchor.
    pub const fn is_anchor(self) -> bool {
        matches!(self, Self::Anchor(_))
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Anchor(v) => write!(f, "{v}"),
            Self::Concept(c) => write!(f, "{c}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let agent = AgentId::new();
        let lesson = LessonId::new();
        assert_ne!(agent.into_inner(), Uuid::nil());
        assert_ne!(lesson.into_inner(), Uuid::nil());
    }

    #[test]
    fn virtue_id_display_is_zero_padded() {
        assert_eq!(VirtueId(1).to_string(), "V01");
        assert_eq!(VirtueId(19).to_string(), "V19");
    }

    #[test]
    fn virtue_id_from_ordinal_rejects_out_of_range() {
        assert!(VirtueId::from_ordinal(0).is_none());
        assert!(VirtueId::from_ordinal(20).is_none());
        assert!(VirtueId::from_ordinal(1).is_some());
        assert!(VirtueId::from_ordinal(19).is_some());
    }

    #[test]
    fn node_id_roundtrip_serde() {
        let node = NodeId::Anchor(VirtueId(2));
        let json = serde_json::to_string(&node).unwrap();
        let restored: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(node, restored);
    }
}
