//! Enumeration types shared across the Soul Kiln workspace.

use serde::{Deserialize, Serialize};

/// Whether a virtue anchor is the single Foundation virtue or one of the
/// eighteen Aspirational virtues.
///
/// Per invariant I1, exactly one anchor has `Tier::Foundation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// The single virtue with an absolute, unmodulated threshold (0.99)
    /// that gates coherence regardless of other metrics.
    Foundation,
    /// Any other virtue; subject to growth and contextual thresholds.
    Aspirational,
}

/// An agent's behavioral archetype, derived by the Gestalt Analyzer (C8)
/// from cluster affinities, or left `Untyped` when no cluster leads by a
/// sufficient margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    /// Favors protective, stabilizing, boundary-respecting virtues.
    Guardian,
    /// Favors exploratory, knowledge-seeking virtues.
    Seeker,
    /// Favors sacrificial, other-directed virtues.
    Servant,
    /// Favors reflective, self-regulating virtues.
    Contemplative,
    /// No cluster affinity leads the runner-up by the required margin.
    Untyped,
}

/// The lifecycle status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Still subject to selection, variation, and dissolution.
    Evolving,
    /// Bound to an external identity; excluded from selection but still
    /// tested each generation.
    Bound,
    /// Irreversibly removed from the population.
    Dissolved,
    /// Halted after an invariant breach during its own trajectory run;
    /// excluded from further evaluation until an operator intervenes.
    Quarantined,
}

/// Direction of traversal for a [`crate::ids::NodeId`] neighbor query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Edges whose target is the queried node.
    Incoming,
    /// Edges whose source is the queried node.
    Outgoing,
}

/// Severity of a warning issued by the Mercy Machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningSeverity {
    /// Advances the Mercy state one step; expires and regresses normally.
    Low,
    /// Advances one step; triggers a grace-period dissolution if already
    /// at `Dissolution`.
    Medium,
    /// May jump an agent straight to `Dissolved` when it reflects
    /// deliberate trust-poisoning.
    High,
}

/// The category of a Knowledge Pool lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonKind {
    /// A trajectory or agent failure worth remembering.
    Failure,
    /// A trajectory or agent success worth remembering.
    Success,
    /// A non-binary observation that doesn't cleanly classify as a
    /// success or failure.
    Insight,
    /// A recorded trade-off between two or more virtues.
    TradeOff,
}

/// The top-level verdict a [`crate::structs::CoherenceReport`] carries.
///
/// Precedence (highest first): `FoundationFailed` overrides every other
/// verdict; then `Coherent`; then `Growing`; then `Struggling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoherenceVerdict {
    /// Foundation rate, aspirational rate, coverage, and dominance all
    /// meet their thresholds.
    Coherent,
    /// Not yet coherent, but overall capture rate improved by at least
    /// `GROWTH_THRESHOLD` since the previous report.
    Growing,
    /// Neither coherent nor improving.
    Struggling,
    /// Foundation capture rate is below 0.99; takes precedence over every
    /// other verdict except a dissolution triggered by the Mercy Machine.
    FoundationFailed,
}

/// The Mercy Machine's per-agent state.
///
/// The numeric suffix is the active warning count that state represents;
/// `count()` and `from_count()` convert between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MercyState {
    /// No active warnings.
    Good,
    /// One active warning.
    Caution,
    /// Two active warnings.
    Probation,
    /// Three active warnings (`MAX_WARNINGS`); a pending dissolution
    /// verdict is in force until expiry or growth clearance.
    Dissolution,
    /// Terminal: the agent has been dissolved.
    Dissolved,
}

impl MercyState {
    /// The non-terminal states in ascending warning-count order.
    const LADDER: [Self; 4] = [Self::Good, Self::Caution, Self::Probation, Self::Dissolution];

    /// Map an active warning count (`0..=3`) to its Mercy state.
    ///
    /// Counts above `MAX_WARNINGS` (3) saturate at `Dissolution` rather
    /// than panicking, since the caller enforces `MAX_WARNINGS` separately.
    pub const fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Good,
            1 => Self::Caution,
            2 => Self::Probation,
            _ => Self::Dissolution,
        }
    }

    /// The warning count this state represents, or `None` for `Dissolved`.
    pub const fn count(self) -> Option<u8> {
        match self {
            Self::Good => Some(0),
            Self::Caution => Some(1),
            Self::Probation => Some(2),
            Self::Dissolution => Some(3),
            Self::Dissolved => None,
        }
    }

    /// Advance one step up the ladder (more warnings). `Dissolution` stays
    /// at `Dissolution` -- escalating past it is `Dissolved`, handled by
    /// the caller via explicit dissolution rather than this step function.
    #[must_use]
    pub const fn advance(self) -> Self {
        match self {
            Self::Good => Self::Caution,
            Self::Caution => Self::Probation,
            Self::Probation | Self::Dissolution => Self::Dissolution,
            Self::Dissolved => Self::Dissolved,
        }
    }

    /// Regress one step down the ladder (fewer warnings), no lower than
    /// `Good`.
    #[must_use]
    pub const fn regress(self) -> Self {
        match self {
            Self::Good | Self::Dissolved => self,
            Self::Caution => Self::Good,
            Self::Probation => Self::Caution,
            Self::Dissolution => Self::Probation,
        }
    }

    /// Whether this state is the non-terminal ladder (not `Dissolved`).
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Dissolved)
    }

    /// Iterate the non-terminal ladder states in ascending order.
    pub fn ladder() -> impl Iterator<Item = Self> {
        Self::LADDER.into_iter()
    }
}

/// Intent classification produced by harm classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmIntent {
    /// A first-time or unintended failure; no malice implied.
    Imperfection,
    /// A pattern consistent with deliberate trust-poisoning or repeated
    /// foundation-virtue violation.
    DeliberateHarm,
}

/// Recommended response produced by harm classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmRecommendation {
    /// Record a Lesson; no warning issued.
    Teach,
    /// Issue a `Low` warning.
    Warn,
    /// Dissolve the agent.
    Dissolve,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mercy_state_count_roundtrips() {
        for state in MercyState::ladder() {
            let count = state.count().unwrap();
            assert_eq!(MercyState::from_count(count), state);
        }
    }

    #[test]
    fn mercy_state_advance_saturates_at_dissolution() {
        assert_eq!(MercyState::Dissolution.advance(), MercyState::Dissolution);
    }

    #[test]
    fn mercy_state_regress_floors_at_good() {
        assert_eq!(MercyState::Good.regress(), MercyState::Good);
    }

    #[test]
    fn mercy_state_advance_regress_is_one_step() {
        assert_eq!(MercyState::Good.advance(), MercyState::Caution);
        assert_eq!(MercyState::Caution.advance(), MercyState::Probation);
        assert_eq!(MercyState::Probation.regress(), MercyState::Caution);
    }
}
