//! The shared node store: virtue anchors and mutable concepts.
//!
//! [`GraphSubstrate`] exclusively owns node identity and anchor data
//! (§3 Ownership). It never moves or deletes an anchor once the registry
//! has initialized it. Concepts may be created freely and pruned if they
//! become fully isolated.

use std::collections::BTreeMap;

use kiln_types::{Concept, ConceptId, NodeId, VirtueAnchor, VirtueId};

use crate::error::GraphError;

/// The shared node store.
///
/// Anchors are populated once by [`crate::registry::VirtueRegistry::initialize`]
/// and never change afterward; concepts are created by stimulus ingestion
/// or crossover and may be pruned when fully isolated.
#[derive(Debug, Clone, Default)]
pub struct GraphSubstrate {
    anchors: BTreeMap<VirtueId, VirtueAnchor>,
    concepts: BTreeMap<ConceptId, Concept>,
}

impl GraphSubstrate {
    /// Create an empty substrate with no anchors and no concepts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the anchor set. Callable only once; intended to be called
    /// exclusively from [`crate::registry::VirtueRegistry::initialize`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateAnchor`] if anchors are already
    /// present.
    pub(crate) fn install_anchors(
        &mut self,
        anchors: Vec<VirtueAnchor>,
    ) -> Result<(), GraphError> {
        if !self.anchors.is_empty() {
            return Err(GraphError::DuplicateAnchor);
        }
        for anchor in anchors {
            self.anchors.insert(anchor.id, anchor);
        }
        Ok(())
    }

    /// Create a new concept with the given name and baseline activation.
    pub fn create_concept(&mut self, name: impl Into<String>, baseline_activation: f64) -> ConceptId {
        let id = ConceptId::new();
        self.concepts.insert(
            id,
            Concept {
                id,
                name: name.into(),
                baseline_activation,
            },
        );
        id
    }

    /// Remove a concept. Only valid when the concept has no edges in any
    /// overlay; callers are responsible for checking isolation first.
    pub fn remove_concept(&mut self, id: ConceptId) -> Option<Concept> {
        self.concepts.remove(&id)
    }

    /// Re-insert a concept under a previously assigned id, overwriting any
    /// existing entry. Used only by session persistence to rebuild a
    /// substrate from a serialized snapshot, where overlay edges already
    /// reference the original `ConceptId`s and a freshly generated one
    /// would orphan them.
    pub fn restore_concept(&mut self, concept: Concept) {
        self.concepts.insert(concept.id, concept);
    }

    /// Look up a node by id, returning its baseline activation and
    /// whether it is an anchor.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the node does not exist.
    pub fn get_node(&self, node: NodeId) -> Result<NodeInfo, GraphError> {
        match node {
            NodeId::Anchor(v) => self
                .anchors
                .get(&v)
                .map(|a| NodeInfo {
                    baseline_activation: a.baseline_activation,
                    is_anchor: true,
                })
                .ok_or(GraphError::UnknownNode { node }),
            NodeId::Concept(c) => self
                .concepts
                .get(&c)
                .map(|concept| NodeInfo {
                    baseline_activation: concept.baseline_activation,
                    is_anchor: false,
                })
                .ok_or(GraphError::UnknownNode { node }),
        }
    }

    /// Whether a node exists in the substrate.
    pub fn contains(&self, node: NodeId) -> bool {
        match node {
            NodeId::Anchor(v) => self.anchors.contains_key(&v),
            NodeId::Concept(c) => self.concepts.contains_key(&c),
        }
    }

    /// Return all anchors, in ascending `VirtueId` order.
    pub fn anchors(&self) -> impl Iterator<Item = &VirtueAnchor> {
        self.anchors.values()
    }

    /// Return all concept ids.
    pub fn concept_ids(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.concepts.keys().copied()
    }

    /// Return all concepts.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    /// Number of anchors currently installed.
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Number of concepts currently installed.
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }
}

/// The baseline information returned by [`GraphSubstrate::get_node`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeInfo {
    /// The node's baseline activation before any spread.
    pub baseline_activation: f64,
    /// Whether this node is a virtue anchor.
    pub is_anchor: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_types::{Archetype, Tier};

    fn sample_anchor(ordinal: u8) -> VirtueAnchor {
        VirtueAnchor {
            id: VirtueId::from_ordinal(ordinal).unwrap(),
            name: format!("virtue-{ordinal}"),
            tier: if ordinal == 1 { Tier::Foundation } else { Tier::Aspirational },
            cluster: Archetype::Guardian,
            base_threshold: 0.7,
            baseline_activation: 0.3,
        }
    }

    #[test]
    fn install_anchors_rejects_second_call() {
        let mut substrate = GraphSubstrate::new();
        substrate.install_anchors(vec![sample_anchor(1)]).unwrap();
        let err = substrate.install_anchors(vec![sample_anchor(2)]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateAnchor));
    }

    #[test]
    fn create_concept_is_retrievable() {
        let mut substrate = GraphSubstrate::new();
        let id = substrate.create_concept("ember", 0.1);
        let info = substrate.get_node(NodeId::Concept(id)).unwrap();
        assert!(!info.is_anchor);
        assert!((info.baseline_activation - 0.1).abs() < 1e-9);
    }

    #[test]
    fn get_node_unknown_concept_errors() {
        let substrate = GraphSubstrate::new();
        let err = substrate
            .get_node(NodeId::Concept(ConceptId::new()))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode { .. }));
    }
}
