//! K-means clustering over gestalt embeddings.
//!
//! Initialization picks `k` evenly spaced points from the input rather
//! than a random draw, so repeated calls on the same population are
//! reproducible without threading a seed through the comparison layer.

use crate::error::GestaltError;

/// The outcome of one `k_means` run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster index assigned to each input point, same order as input.
    pub assignments: Vec<usize>,
    /// The `k` final centroids.
    pub centroids: Vec<Vec<f64>>,
}

/// Cluster `points` into `k` groups via Lloyd's algorithm, iterating
/// until assignments stop changing or `max_iters` is reached.
///
/// # Errors
///
/// Returns [`GestaltError::EmptyInput`] if `points` is empty, or
/// [`GestaltError::TooFewPoints`] if `points.len() < k`.
#[allow(clippy::arithmetic_side_effects)]
pub fn k_means(points: &[Vec<f64>], k: usize, max_iters: usize) -> Result<KMeansResult, GestaltError> {
    if points.is_empty() {
        return Err(GestaltError::EmptyInput);
    }
    if points.len() < k || k == 0 {
        return Err(GestaltError::TooFewPoints { k, available: points.len() });
    }

    let mut centroids: Vec<Vec<f64>> = (0..k).filter_map(|i| points.get(i * points.len() / k).cloned()).collect();
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..max_iters.max(1) {
        let mut changed = false;
        for (index, point) in points.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if let Some(slot) = assignments.get_mut(index) {
                if *slot != nearest {
                    *slot = nearest;
                    changed = true;
                }
            }
        }

        let width = centroids.first().map_or(0, Vec::len);
        let mut sums = vec![vec![0.0; width]; k];
        let mut counts = vec![0usize; k];
        for (index, point) in points.iter().enumerate() {
            let Some(&cluster) = assignments.get(index) else { continue };
            if let Some(count) = counts.get_mut(cluster) {
                *count += 1;
            }
            if let Some(sum_row) = sums.get_mut(cluster) {
                for (sum, value) in sum_row.iter_mut().zip(point.iter()) {
                    *sum += value;
                }
            }
        }

        for cluster in 0..k {
            let count = counts.get(cluster).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let count_f64 = count as f64;
            if let Some(sum_row) = sums.get(cluster) {
                if let Some(centroid) = centroids.get_mut(cluster) {
                    *centroid = sum_row.iter().map(|sum| sum / count_f64).collect();
                }
            }
        }

        if !changed {
            break;
        }
    }

    Ok(KMeansResult { assignments, centroids })
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| squared_distance(point, a).partial_cmp(&squared_distance(point, b)).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(index, _)| index)
}

#[allow(clippy::arithmetic_side_effects)]
fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn two_tight_clusters_separate_cleanly() {
        let points = vec![vec![0.0, 0.0], vec![0.1, 0.1], vec![10.0, 10.0], vec![10.1, 9.9]];
        let result = k_means(&points, 2, 20).unwrap();
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[2], result.assignments[3]);
        assert_ne!(result.assignments[0], result.assignments[2]);
    }

    #[test]
    fn empty_input_errors() {
        let err = k_means(&[], 2, 10).unwrap_err();
        assert!(matches!(err, GestaltError::EmptyInput));
    }

    #[test]
    fn fewer_points_than_k_errors() {
        let points = vec![vec![0.0]];
        let err = k_means(&points, 2, 10).unwrap_err();
        assert!(matches!(err, GestaltError::TooFewPoints { .. }));
    }
}
