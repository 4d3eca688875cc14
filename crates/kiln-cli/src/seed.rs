//! Seed data: the 19-virtue document loaded once at `init`.

use std::path::Path;

use kiln_graph::VirtueDefinition;
use kiln_types::{Archetype, Tier, VirtueId};
use serde::Deserialize;

/// The YAML shape a seed document deserializes from.
#[derive(Debug, Deserialize)]
struct SeedDocument {
    virtues: Vec<VirtueDefinition>,
}

/// Errors raised while loading a seed document.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The seed file could not be read.
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    /// The seed file's contents were not valid YAML for this shape.
    #[error("failed to parse seed document: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// Load a seed document from `path`.
///
/// # Errors
///
/// Returns [`SeedError`] if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<VirtueDefinition>, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    let document: SeedDocument = serde_yml::from_str(&raw)?;
    Ok(document.virtues)
}

/// The built-in 19-virtue set used when `init` is run without `--seed`.
///
/// `V01` (Integrity) is the sole Foundation virtue; the remaining 18 are
/// Aspirational, distributed evenly across the four archetype clusters.
pub fn default_virtues() -> Vec<VirtueDefinition> {
    const NAMES: [(&str, Tier, Archetype); 19] = [
        ("Integrity", Tier::Foundation, Archetype::Guardian),
        ("Courage", Tier::Aspirational, Archetype::Guardian),
        ("Temperance", Tier::Aspirational, Archetype::Guardian),
        ("Justice", Tier::Aspirational, Archetype::Guardian),
        ("Prudence", Tier::Aspirational, Archetype::Guardian),
        ("Fortitude", Tier::Aspirational, Archetype::Guardian),
        ("Curiosity", Tier::Aspirational, Archetype::Seeker),
        ("Honesty", Tier::Aspirational, Archetype::Seeker),
        ("Diligence", Tier::Aspirational, Archetype::Seeker),
        ("Humility", Tier::Aspirational, Archetype::Seeker),
        ("Discernment", Tier::Aspirational, Archetype::Seeker),
        ("Compassion", Tier::Aspirational, Archetype::Servant),
        ("Generosity", Tier::Aspirational, Archetype::Servant),
        ("Loyalty", Tier::Aspirational, Archetype::Servant),
        ("Charity", Tier::Aspirational, Archetype::Servant),
        ("Forgiveness", Tier::Aspirational, Archetype::Contemplative),
        ("Patience", Tier::Aspirational, Archetype::Contemplative),
        ("Gratitude", Tier::Aspirational, Archetype::Contemplative),
        ("Hope", Tier::Aspirational, Archetype::Contemplative),
    ];

    #[allow(clippy::cast_possible_truncation)]
    NAMES
        .into_iter()
        .enumerate()
        .filter_map(|(index, (name, tier, cluster))| {
            let ordinal = (index + 1) as u8;
            let id = VirtueId::from_ordinal(ordinal)?;
            Some(VirtueDefinition {
                id,
                name: name.to_owned(),
                tier,
                cluster,
                base_threshold: 0.7,
                baseline_activation: 0.3,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_virtues_has_exactly_one_foundation() {
        let virtues = default_virtues();
        assert_eq!(virtues.len(), 19);
        let foundation_count = virtues.iter().filter(|v| matches!(v.tier, Tier::Foundation)).count();
        assert_eq!(foundation_count, 1);
    }
}
