//! Behavioral tendency scoring: each tendency is a weighted sum of
//! designated virtue activations.

use std::collections::BTreeMap;

use kiln_types::VirtueId;

use crate::config::TendencyDefinition;

/// Score every tendency in `definitions` against an activation snapshot,
/// keyed by tendency name in the order `definitions` lists them.
pub fn score_tendencies(definitions: &[TendencyDefinition], activations: &BTreeMap<VirtueId, f64>) -> BTreeMap<String, f64> {
    definitions.iter().map(|tendency| (tendency.name.clone(), score_one(tendency, activations))).collect()
}

#[allow(clippy::arithmetic_side_effects)]
fn score_one(tendency: &TendencyDefinition, activations: &BTreeMap<VirtueId, f64>) -> f64 {
    tendency
        .weights
        .iter()
        .map(|(&virtue, &weight)| weight * activations.get(&virtue).copied().unwrap_or(0.0))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uniform_tendency_is_mean_of_members() {
        let mut weights = BTreeMap::new();
        weights.insert(VirtueId::from_ordinal(1).unwrap(), 0.5);
        weights.insert(VirtueId::from_ordinal(2).unwrap(), 0.5);
        let tendency = TendencyDefinition { name: "test".to_owned(), weights };

        let mut activations = BTreeMap::new();
        activations.insert(VirtueId::from_ordinal(1).unwrap(), 0.4);
        activations.insert(VirtueId::from_ordinal(2).unwrap(), 0.8);

        let score = score_one(&tendency, &activations);
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn missing_activation_defaults_to_zero() {
        let mut weights = BTreeMap::new();
        weights.insert(VirtueId::from_ordinal(3).unwrap(), 1.0);
        let tendency = TendencyDefinition { name: "test".to_owned(), weights };
        let score = score_one(&tendency, &BTreeMap::new());
        assert!((score - 0.0).abs() < 1e-9);
    }
}
