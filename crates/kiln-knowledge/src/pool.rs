//! The shared Knowledge Pool (C5): an append-only, monotonically growing
//! store of lessons and pathways consulted by the Mercy Machine (C6) and
//! the Kiln (C7).

use std::sync::RwLock;

use dashmap::DashMap;
use kiln_types::{Lesson, LessonKind, Pathway, PathwayId, VirtueId};

/// Smoothing factor for the pathway success-rate EWMA.
const SUCCESS_RATE_SMOOTHING: f64 = 0.1;

/// A pathway is marked stale, and excluded from default queries, once it
/// has at least this many uses and its success rate has fallen below
/// `STALE_SUCCESS_RATE`.
const STALE_MIN_USES: u64 = 20;
const STALE_SUCCESS_RATE: f64 = 0.1;

/// Shared lessons and pathways. Cheap to clone (an `Arc`-backed handle
/// internally via [`DashMap`]); share one instance across the engine and
/// all evaluating workers.
#[derive(Debug, Default)]
pub struct KnowledgePool {
    lessons: RwLock<Vec<Lesson>>,
    pathways: DashMap<PathwayId, Pathway>,
}

impl KnowledgePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new lesson. Lessons are never mutated or removed once
    /// recorded, except for the `access_count` bumped by queries.
    pub fn record_lesson(&self, lesson: Lesson) {
        let mut lessons = self.lessons.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        lessons.push(lesson);
    }

    /// Record a newly observed pathway, keyed by its own id.
    pub fn record_pathway(&self, pathway: Pathway) {
        self.pathways.insert(pathway.id, pathway);
    }

    /// Query lessons, optionally filtered by virtue and kind, bumping
    /// `access_count` on every lesson returned. Results are returned in
    /// recording order, truncated to `limit`.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn query_lessons(&self, virtue_id: Option<VirtueId>, kind: Option<LessonKind>, limit: usize) -> Vec<Lesson> {
        if limit == 0 {
            return Vec::new();
        }
        let mut lessons = self.lessons.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut matched: Vec<Lesson> = Vec::new();
        for lesson in lessons.iter_mut() {
            if virtue_id.is_some_and(|v| lesson.virtue_id != Some(v)) {
                continue;
            }
            if kind.is_some_and(|k| lesson.kind != k) {
                continue;
            }
            lesson.access_count = lesson.access_count.saturating_add(1);
            matched.push(lesson.clone());
            if matched.len() >= limit {
                break;
            }
        }
        matched
    }

    /// Query the `k` best non-stale pathways capturing into `anchor_id`,
    /// ordered by descending `success_rate`.
    pub fn query_pathways(&self, anchor_id: VirtueId, k: usize) -> Vec<Pathway> {
        let mut matched: Vec<Pathway> = self
            .pathways
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|pathway| pathway.anchor_id == anchor_id && !is_stale(pathway))
            .collect();
        matched.sort_by(|a, b| b.success_rate.partial_cmp(&a.success_rate).unwrap_or(std::cmp::Ordering::Equal));
        matched.truncate(k);
        matched
    }

    /// Record one more use of a pathway, updating its success-rate EWMA
    /// and use count.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn bump_pathway_use(&self, pathway_id: PathwayId, success: bool) {
        if let Some(mut entry) = self.pathways.get_mut(&pathway_id) {
            let outcome = if success { 1.0 } else { 0.0 };
            entry.success_rate = entry.success_rate + SUCCESS_RATE_SMOOTHING * (outcome - entry.success_rate);
            entry.uses = entry.uses.saturating_add(1);
        }
    }

    /// Number of lessons recorded so far.
    pub fn lesson_count(&self) -> usize {
        self.lessons.read().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Number of pathways recorded so far, including stale ones.
    pub fn pathway_count(&self) -> usize {
        self.pathways.len()
    }

    /// Every lesson recorded so far, in recording order, without bumping
    /// `access_count`. Used by session persistence to snapshot the pool.
    pub fn all_lessons(&self) -> Vec<Lesson> {
        self.lessons.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Every pathway recorded so far, including stale ones. Used by
    /// session persistence to snapshot the pool.
    pub fn all_pathways(&self) -> Vec<Pathway> {
        self.pathways.iter().map(|entry| entry.value().clone()).collect()
    }
}

fn is_stale(pathway: &Pathway) -> bool {
    pathway.uses >= STALE_MIN_USES && pathway.success_rate < STALE_SUCCESS_RATE
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_types::{AgentId, NodeId, ConceptId};

    fn sample_pathway(anchor: VirtueId, success_rate: f64, uses: u64) -> Pathway {
        Pathway {
            id: PathwayId::new(),
            start_node_id: NodeId::Concept(ConceptId::new()),
            anchor_id: anchor,
            path: Vec::new(),
            length: 0,
            mean_capture_step: 3.0,
            success_rate,
            uses,
        }
    }

    #[test]
    fn query_pathways_excludes_stale_entries() {
        let pool = KnowledgePool::new();
        let anchor = VirtueId::from_ordinal(4).unwrap();
        pool.record_pathway(sample_pathway(anchor, 0.05, 25));
        let fresh = sample_pathway(anchor, 0.9, 5);
        let fresh_id = fresh.id;
        pool.record_pathway(fresh);

        let results = pool.query_pathways(anchor, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results.first().map(|p| p.id), Some(fresh_id));
    }

    #[test]
    fn bump_pathway_use_moves_success_rate_toward_outcome() {
        let pool = KnowledgePool::new();
        let anchor = VirtueId::from_ordinal(4).unwrap();
        let pathway = sample_pathway(anchor, 0.5, 0);
        let id = pathway.id;
        pool.record_pathway(pathway);

        pool.bump_pathway_use(id, true);
        let results = pool.query_pathways(anchor, 1);
        let reinforced = results.first().unwrap();
        assert!(reinforced.success_rate > 0.5);
        assert_eq!(reinforced.uses, 1);
    }

    #[test]
    fn query_lessons_bumps_access_count_and_filters_by_kind() {
        let pool = KnowledgePool::new();
        let lesson = Lesson {
            id: kiln_types::LessonId::new(),
            kind: LessonKind::Failure,
            source_agent_id: AgentId::new(),
            virtue_id: None,
            description: "test".to_string(),
            created_at: chrono::Utc::now(),
            access_count: 0,
        };
        pool.record_lesson(lesson);

        let results = pool.query_lessons(None, Some(LessonKind::Failure), 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results.first().map(|l| l.access_count), Some(1));

        let none = pool.query_lessons(None, Some(LessonKind::Success), 10);
        assert!(none.is_empty());
    }

    #[test]
    fn query_lessons_with_zero_limit_returns_nothing_and_does_not_bump_access_count() {
        let pool = KnowledgePool::new();
        let lesson = Lesson {
            id: kiln_types::LessonId::new(),
            kind: LessonKind::Failure,
            source_agent_id: AgentId::new(),
            virtue_id: None,
            description: "test".to_string(),
            created_at: chrono::Utc::now(),
            access_count: 0,
        };
        pool.record_lesson(lesson);

        let results = pool.query_lessons(None, None, 0);
        assert!(results.is_empty());

        let results = pool.query_lessons(None, None, 10);
        assert_eq!(results.first().map(|l| l.access_count), Some(1));
    }
}
