//! Embedding construction and comparison: the 41-dimensional vector
//! `[activations(19) || tendencies(10) || relation_stats(8) ||
//! archetype_onehot(4)]` and the cosine similarity over it.

use crate::config::EMBEDDING_DIM;
use crate::error::GestaltError;

/// Concatenate the four embedding segments into one 41-dimensional
/// vector, in the fixed order `activations || tendencies ||
/// relation_stats || archetype_onehot`.
pub fn build_embedding(activations: &[f64], tendencies: &[f64], relation_stats: [f64; 8], archetype_one_hot: [f64; 4]) -> Vec<f64> {
    let mut embedding = Vec::with_capacity(EMBEDDING_DIM);
    embedding.extend_from_slice(activations);
    embedding.extend_from_slice(tendencies);
    embedding.extend_from_slice(&relation_stats);
    embedding.extend_from_slice(&archetype_one_hot);
    embedding
}

/// Cosine similarity between two embeddings of equal dimension.
///
/// Returns `0.0` if either embedding is the zero vector (cosine
/// similarity is undefined there; treating it as "no similarity" is safer
/// than propagating a `NaN`).
///
/// # Errors
///
/// Returns [`GestaltError::DimensionMismatch`] if `a` and `b` have
/// different lengths.
#[allow(clippy::arithmetic_side_effects)]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, GestaltError> {
    if a.len() != b.len() {
        return Err(GestaltError::DimensionMismatch { left: a.len(), right: b.len() });
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![0.3, 0.5, 0.8];
        let similarity = cosine_similarity(&v, &v).unwrap();
        assert!((similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let similarity = cosine_similarity(&a, &b).unwrap();
        assert!(similarity.abs() < 1e-9);
    }

    #[test]
    fn mismatched_dimension_errors() {
        let err = cosine_similarity(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, GestaltError::DimensionMismatch { .. }));
    }

    #[test]
    fn zero_vector_has_similarity_zero_not_nan() {
        let similarity = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert!((similarity - 0.0).abs() < 1e-9);
    }

    #[test]
    fn build_embedding_concatenates_segments_in_order() {
        let activations = vec![0.1; 19];
        let tendencies = vec![0.2; 10];
        let embedding = build_embedding(&activations, &tendencies, [0.3; 8], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(embedding.len(), EMBEDDING_DIM);
        assert!((embedding[0] - 0.1).abs() < 1e-9);
        assert!((embedding[19] - 0.2).abs() < 1e-9);
        assert!((embedding[29] - 0.3).abs() < 1e-9);
        assert!((embedding[38] - 1.0).abs() < 1e-9);
    }
}
