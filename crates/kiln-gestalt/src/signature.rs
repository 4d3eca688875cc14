//! Character signature: the normalized per-anchor capture-count vector.

use std::collections::BTreeMap;

use kiln_types::VirtueId;

/// Normalize `per_virtue_captures` (raw counts from a [`kiln_types::CoherenceReport`])
/// into a distribution over anchors. Anchors with no captures appear with
/// `0.0`. If every anchor has zero captures, every entry is `0.0` rather
/// than dividing by zero.
#[allow(clippy::arithmetic_side_effects)]
pub fn character_signature(per_virtue_captures: &BTreeMap<VirtueId, u32>) -> BTreeMap<VirtueId, f64> {
    let total: u32 = per_virtue_captures.values().sum();
    if total == 0 {
        return per_virtue_captures.keys().map(|&v| (v, 0.0)).collect();
    }
    #[allow(clippy::cast_precision_loss)]
    let total_f64 = f64::from(total);
    per_virtue_captures
        .iter()
        .map(|(&v, &count)| {
            #[allow(clippy::cast_precision_loss)]
            let count_f64 = f64::from(count);
            (v, count_f64 / total_f64)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn signature_sums_to_one() {
        let mut captures = BTreeMap::new();
        captures.insert(VirtueId::from_ordinal(1).unwrap(), 3);
        captures.insert(VirtueId::from_ordinal(2).unwrap(), 1);
        let signature = character_signature(&captures);
        let sum: f64 = signature.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn no_captures_is_all_zero() {
        let mut captures = BTreeMap::new();
        captures.insert(VirtueId::from_ordinal(1).unwrap(), 0);
        captures.insert(VirtueId::from_ordinal(2).unwrap(), 0);
        let signature = character_signature(&captures);
        assert!(signature.values().all(|&v| v == 0.0));
    }
}
