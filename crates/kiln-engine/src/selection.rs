//! Parent-selection strategies for the Kiln's variation phase.

use kiln_types::AgentId;
use rand::seq::IndexedRandom;
use rand::Rng;

/// A configured parent-selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Selection {
    /// Repeated k-way tournaments; the highest-fitness contestant drawn
    /// wins each tournament.
    Tournament {
        /// Contestants per tournament.
        k: usize,
    },
    /// Sort by fitness descending and sample uniformly from the top `top`.
    Truncation {
        /// Number of top candidates eligible to be drawn from.
        top: usize,
    },
    /// Fitness-proportionate (roulette-wheel) sampling.
    Roulette,
}

impl Default for Selection {
    fn default() -> Self {
        Self::Tournament { k: 3 }
    }
}

/// Draw `n` parent ids (with replacement) from `candidates` using
/// `selection`. Returns an empty vec if `candidates` is empty.
pub fn select_parents(candidates: &[(AgentId, f64)], n: usize, selection: Selection, rng: &mut impl Rng) -> Vec<AgentId> {
    if candidates.is_empty() {
        return Vec::new();
    }
    match selection {
        Selection::Tournament { k } => (0..n).map(|_| tournament_once(candidates, k.max(1), rng)).collect(),
        Selection::Truncation { top } => truncation_draw(candidates, n, top.max(1), rng),
        Selection::Roulette => (0..n).map(|_| roulette_once(candidates, rng)).collect(),
    }
}

fn fallback(candidates: &[(AgentId, f64)]) -> AgentId {
    candidates.first().copied().map_or_else(AgentId::new, |(id, _)| id)
}

fn tournament_once(candidates: &[(AgentId, f64)], k: usize, rng: &mut impl Rng) -> AgentId {
    let mut best: Option<(AgentId, f64)> = None;
    for _ in 0..k {
        let Some(&(id, fitness)) = candidates.choose(rng) else { continue };
        if best.is_none_or(|(_, b)| fitness > b) {
            best = Some((id, fitness));
        }
    }
    best.map_or_else(|| fallback(candidates), |(id, _)| id)
}

fn truncation_draw(candidates: &[(AgentId, f64)], n: usize, top: usize, rng: &mut impl Rng) -> Vec<AgentId> {
    let mut sorted: Vec<(AgentId, f64)> = candidates.to_vec();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let pool: Vec<(AgentId, f64)> = sorted.into_iter().take(top).collect();
    let default = fallback(candidates);
    (0..n).map(|_| pool.choose(rng).copied().map_or(default, |(id, _)| id)).collect()
}

#[allow(clippy::arithmetic_side_effects)]
fn roulette_once(candidates: &[(AgentId, f64)], rng: &mut impl Rng) -> AgentId {
    const FLOOR: f64 = 1e-6;
    let default = fallback(candidates);
    let total: f64 = candidates.iter().map(|&(_, f)| f.max(FLOOR)).sum();
    if total <= 0.0 {
        return default;
    }
    let mut pick = rng.random_range(0.0..total);
    for &(id, fitness) in candidates {
        let weight = fitness.max(FLOOR);
        if pick < weight {
            return id;
        }
        pick -= weight;
    }
    default
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn candidates() -> Vec<(AgentId, f64)> {
        vec![(AgentId::new(), 0.1), (AgentId::new(), 0.9), (AgentId::new(), 0.5)]
    }

    #[test]
    fn empty_candidates_yields_empty_selection() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_parents(&[], 5, Selection::default(), &mut rng).is_empty());
    }

    #[test]
    fn tournament_always_draws_from_candidate_set() {
        let pool = candidates();
        let mut rng = StdRng::seed_from_u64(7);
        let drawn = select_parents(&pool, 10, Selection::Tournament { k: 3 }, &mut rng);
        assert_eq!(drawn.len(), 10);
        for id in drawn {
            assert!(pool.iter().any(|&(candidate, _)| candidate == id));
        }
    }

    #[test]
    fn truncation_only_draws_from_top_slice() {
        let pool = candidates();
        let mut sorted = pool.clone();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        let top_id = sorted[0].0;
        let mut rng = StdRng::seed_from_u64(3);
        let drawn = select_parents(&pool, 20, Selection::Truncation { top: 1 }, &mut rng);
        assert!(drawn.iter().all(|&id| id == top_id));
    }

    #[test]
    fn roulette_always_draws_from_candidate_set() {
        let pool = candidates();
        let mut rng = StdRng::seed_from_u64(42);
        let drawn = select_parents(&pool, 10, Selection::Roulette, &mut rng);
        for id in drawn {
            assert!(pool.iter().any(|&(candidate, _)| candidate == id));
        }
    }
}
