//! Id parsing for command-line arguments.
//!
//! None of `kiln-types`'s id wrappers implement `FromStr` (they are
//! serialized as JSON, not parsed from shell arguments), so the command
//! surface does its own narrow parsing here instead of leaning on clap's
//! blanket `FromStr`-based value parser.

use kiln_types::{AgentId, ConceptId, NodeId, VirtueId};
use uuid::Uuid;

use crate::error::CliError;

/// Parse a command-line agent id argument.
///
/// # Errors
///
/// Returns [`CliError::User`] if `raw` is not a valid UUID.
pub fn agent_id(raw: &str) -> Result<AgentId, CliError> {
    Uuid::parse_str(raw)
        .map(AgentId::from)
        .map_err(|err| CliError::User(format!("invalid agent id {raw:?}: {err}")))
}

/// Parse a command-line node id argument: `V01`..`V19` for an anchor, or a
/// UUID for a concept.
///
/// # Errors
///
/// Returns [`CliError::User`] if `raw` matches neither shape.
pub fn node_id(raw: &str) -> Result<NodeId, CliError> {
    if let Some(digits) = raw.strip_prefix('V').or_else(|| raw.strip_prefix('v')) {
        let ordinal: u8 = digits
            .parse()
            .map_err(|_err| CliError::User(format!("invalid anchor id {raw:?}: expected V01..V19")))?;
        let virtue = VirtueId::from_ordinal(ordinal).ok_or_else(|| CliError::User(format!("invalid anchor id {raw:?}: ordinal out of range 1..=19")))?;
        return Ok(NodeId::Anchor(virtue));
    }
    Uuid::parse_str(raw)
        .map(|uuid| NodeId::Concept(ConceptId::from(uuid)))
        .map_err(|err| CliError::User(format!("invalid node id {raw:?}: {err}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn anchor_id_parses_zero_padded_ordinal() {
        let node = node_id("V01").unwrap();
        assert_eq!(node, NodeId::Anchor(VirtueId::FOUNDATION));
    }

    #[test]
    fn anchor_id_rejects_out_of_range_ordinal() {
        assert!(node_id("V20").is_err());
    }

    #[test]
    fn concept_id_parses_uuid() {
        let raw = Uuid::now_v7().to_string();
        let node = node_id(&raw).unwrap();
        assert!(matches!(node, NodeId::Concept(_)));
    }

    #[test]
    fn agent_id_rejects_garbage() {
        assert!(agent_id("not-a-uuid").is_err());
    }
}
