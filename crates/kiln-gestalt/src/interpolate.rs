//! Embedding interpolation: a convex combination of two embeddings. No
//! semantic claim is made about the intermediate point -- it is a
//! comparison aid, not a derivable agent state.

use crate::error::GestaltError;

/// Interpolate between `a` and `b` at `alpha ∈ [0, 1]`: `alpha = 0.0`
/// returns `a`, `alpha = 1.0` returns `b`. `alpha` is clamped into
/// `[0, 1]` before use.
///
/// # Errors
///
/// Returns [`GestaltError::DimensionMismatch`] if `a` and `b` have
/// different lengths.
#[allow(clippy::arithmetic_side_effects)]
pub fn interpolate(a: &[f64], b: &[f64], alpha: f64) -> Result<Vec<f64>, GestaltError> {
    if a.len() != b.len() {
        return Err(GestaltError::DimensionMismatch { left: a.len(), right: b.len() });
    }
    let alpha = alpha.clamp(0.0, 1.0);
    Ok(a.iter().zip(b.iter()).map(|(&x, &y)| x * (1.0 - alpha) + y * alpha).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn alpha_zero_returns_a() {
        let a = vec![1.0, 2.0];
        let b = vec![5.0, 9.0];
        assert_eq!(interpolate(&a, &b, 0.0).unwrap(), a);
    }

    #[test]
    fn alpha_one_returns_b() {
        let a = vec![1.0, 2.0];
        let b = vec![5.0, 9.0];
        assert_eq!(interpolate(&a, &b, 1.0).unwrap(), b);
    }

    #[test]
    fn alpha_half_is_midpoint() {
        let a = vec![0.0, 0.0];
        let b = vec![2.0, 4.0];
        let mid = interpolate(&a, &b, 0.5).unwrap();
        assert!((mid[0] - 1.0).abs() < 1e-9);
        assert!((mid[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_alpha_is_clamped() {
        let a = vec![0.0];
        let b = vec![10.0];
        assert_eq!(interpolate(&a, &b, 5.0).unwrap(), vec![10.0]);
        assert_eq!(interpolate(&a, &b, -5.0).unwrap(), vec![0.0]);
    }
}
