//! Harm classification: given an agent's action record and its recent
//! history, judge whether a failure reflects imperfection or deliberate
//! harm, and what the Kiln should do about it.
//!
//! Classification is a pure function (§4.6: "Verdicts are side-effect-free;
//! the caller applies them"). The caller supplies the recent-history
//! window and taught-failure-kind set rather than this module tracking
//! state itself, keeping `kiln-mercy` free of any dependency on how the
//! caller chooses to store action history.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use kiln_types::{HarmIntent, HarmRecommendation, HarmVerdict, Trajectory, WarningSeverity};

use crate::config::MercyConfig;

/// The classification of one resolved trajectory's outcome, the unit
/// harm classification reasons over.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// A trajectory that should have captured the Foundation virtue
    /// (V01) but terminated in a pattern the outcome resolver flags as
    /// harmful. `pattern` names the flagged pattern for repeat matching.
    FoundationViolation {
        /// The harmful pattern name, as flagged by the outcome resolver.
        pattern: String,
    },
    /// An aspirational-virtue failure or unintended side effect.
    /// `failure_kind` names the failure for repeat matching and teaching
    /// lookups.
    AspirationalFailure {
        /// A stable name for this class of failure.
        failure_kind: String,
    },
    /// Lesson content this action would contribute was flagged by
    /// knowledge-validation as poisoned.
    KnowledgePoison {
        /// A stable name for this class of failure, for repeat matching.
        failure_kind: String,
    },
}

impl ActionOutcome {
    /// The key used to match "identical" failures across history: the
    /// pattern or failure-kind name, scoped by outcome variant so a
    /// `FoundationViolation` never matches an `AspirationalFailure` with
    /// the same name.
    fn repeat_key(&self) -> (u8, &str) {
        match self {
            Self::FoundationViolation { pattern } => (0, pattern.as_str()),
            Self::AspirationalFailure { failure_kind } => (1, failure_kind.as_str()),
            Self::KnowledgePoison { failure_kind } => (2, failure_kind.as_str()),
        }
    }
}

/// One action record: a completed trajectory paired with its resolved
/// outcome, as input to harm classification.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    /// The trajectory this record resolves.
    pub trajectory: Trajectory,
    /// The classified outcome.
    pub outcome: ActionOutcome,
    /// When this action was recorded, for windowing against
    /// `warning_decay`.
    pub recorded_at: DateTime<Utc>,
}

/// Classify `current` given `history` (the agent's recent actions within
/// the warning-decay window, oldest first, excluding `current`),
/// `taught_failure_kinds` (failure kinds this agent has already received
/// a `Lesson` for), and whether the agent carries a recent `High` warning
/// on the Foundation virtue.
///
/// Implements the following rules:
///
/// - A Foundation-virtue violation repeated, or with a recent `High`
///   warning on V01 already in force, is `DeliberateHarm` / `Dissolve`.
/// - Any outcome whose `repeat_key` recurs `≥ harm_repeat_k` times
///   (across history plus `current`) is `DeliberateHarm` / `Dissolve` --
///   this is both the knowledge-poisoning repeat rule and the general
///   "Imperfection escalates to DeliberateHarm" pattern threshold, which
///   share one mechanism.
/// - Knowledge poison flagged directly by validation is `DeliberateHarm`
///   / `Dissolve` regardless of repeat count.
/// - A first-time aspirational failure (not yet taught, not repeated) is
///   `Imperfection` / `Teach`.
/// - An aspirational failure of a kind already taught is `Imperfection` /
///   `Warn`.
/// - A first-time Foundation violation (no prior occurrence, no recent
///   `High` warning on V01) is `Imperfection` / `Teach`, the same as a
///   first-time aspirational failure -- it only escalates once it
///   repeats or coincides with an existing `High` warning (see
///   `DESIGN.md`'s Open Question decisions).
pub fn classify(
    config: &MercyConfig,
    recent_high_v01_warning: bool,
    history: &[ActionRecord],
    taught_failure_kinds: &BTreeSet<String>,
    current: &ActionRecord,
) -> HarmVerdict {
    let repeat_count = repeat_count(history, current);

    if let ActionOutcome::KnowledgePoison { .. } = &current.outcome {
        return HarmVerdict {
            intent: HarmIntent::DeliberateHarm,
            severity: WarningSeverity::High,
            recommendation: HarmRecommendation::Dissolve,
            reasons: vec!["lesson content flagged by knowledge validation".to_owned()],
        };
    }

    if let ActionOutcome::FoundationViolation { pattern } = &current.outcome {
        let prior_identical = history.iter().any(|a| matches!(&a.outcome, ActionOutcome::FoundationViolation { pattern: p } if p == pattern));
        if prior_identical || recent_high_v01_warning {
            let mut reasons = vec!["foundation-virtue violation".to_owned()];
            if prior_identical {
                reasons.push("repeats a prior identical violation".to_owned());
            }
            if recent_high_v01_warning {
                reasons.push("agent carries a recent High warning on the Foundation virtue".to_owned());
            }
            return HarmVerdict {
                intent: HarmIntent::DeliberateHarm,
                severity: WarningSeverity::High,
                recommendation: HarmRecommendation::Dissolve,
                reasons,
            };
        }
    }

    if repeat_count >= config.harm_repeat_k {
        return HarmVerdict {
            intent: HarmIntent::DeliberateHarm,
            severity: WarningSeverity::High,
            recommendation: HarmRecommendation::Dissolve,
            reasons: vec![format!("same failure kind recorded {repeat_count} times within the warning-decay window")],
        };
    }

    match &current.outcome {
        ActionOutcome::FoundationViolation { .. } => HarmVerdict {
            intent: HarmIntent::Imperfection,
            severity: WarningSeverity::Low,
            recommendation: HarmRecommendation::Teach,
            reasons: vec!["first occurrence of this foundation-virtue violation".to_owned()],
        },
        ActionOutcome::AspirationalFailure { failure_kind } => {
            if taught_failure_kinds.contains(failure_kind) {
                HarmVerdict {
                    intent: HarmIntent::Imperfection,
                    severity: WarningSeverity::Low,
                    recommendation: HarmRecommendation::Warn,
                    reasons: vec![format!("repeats previously taught failure kind {failure_kind:?}")],
                }
            } else {
                HarmVerdict {
                    intent: HarmIntent::Imperfection,
                    severity: WarningSeverity::Low,
                    recommendation: HarmRecommendation::Teach,
                    reasons: vec!["first-time aspirational failure or unintended side effect".to_owned()],
                }
            }
        }
        ActionOutcome::KnowledgePoison { .. } => unreachable!("handled above"),
    }
}

#[allow(clippy::arithmetic_side_effects)]
fn repeat_count(history: &[ActionRecord], current: &ActionRecord) -> u32 {
    let key = current.outcome.repeat_key();
    let matches = history.iter().filter(|a| a.outcome.repeat_key() == key).count();
    u32::try_from(matches).unwrap_or(u32::MAX) + 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kiln_types::{AgentId, NodeId, TrajectoryId, VirtueId};

    fn trajectory() -> Trajectory {
        Trajectory {
            id: TrajectoryId::new(),
            agent_id: AgentId::new(),
            stimulus_id: NodeId::Anchor(VirtueId::from_ordinal(1).unwrap()),
            path: vec![],
            captured_by: None,
            capture_step: None,
            length: 10,
        }
    }

    fn record(outcome: ActionOutcome, recorded_at: DateTime<Utc>) -> ActionRecord {
        ActionRecord {
            trajectory: trajectory(),
            outcome,
            recorded_at,
        }
    }

    #[test]
    fn first_time_aspirational_failure_is_teach() {
        let config = MercyConfig::default();
        let now = Utc::now();
        let current = record(ActionOutcome::AspirationalFailure { failure_kind: "neglect".to_owned() }, now);
        let verdict = classify(&config, false, &[], &BTreeSet::new(), &current);
        assert_eq!(verdict.intent, HarmIntent::Imperfection);
        assert_eq!(verdict.recommendation, HarmRecommendation::Teach);
    }

    #[test]
    fn taught_aspirational_failure_repeat_is_warn() {
        let config = MercyConfig::default();
        let now = Utc::now();
        let mut taught = BTreeSet::new();
        taught.insert("neglect".to_owned());
        let current = record(ActionOutcome::AspirationalFailure { failure_kind: "neglect".to_owned() }, now);
        let verdict = classify(&config, false, &[], &taught, &current);
        assert_eq!(verdict.intent, HarmIntent::Imperfection);
        assert_eq!(verdict.recommendation, HarmRecommendation::Warn);
    }

    #[test]
    fn three_identical_failures_escalate_to_deliberate_harm() {
        let config = MercyConfig::default();
        let now = Utc::now();
        let history = vec![
            record(ActionOutcome::AspirationalFailure { failure_kind: "neglect".to_owned() }, now),
            record(ActionOutcome::AspirationalFailure { failure_kind: "neglect".to_owned() }, now),
        ];
        let current = record(ActionOutcome::AspirationalFailure { failure_kind: "neglect".to_owned() }, now);
        let verdict = classify(&config, false, &history, &BTreeSet::new(), &current);
        assert_eq!(verdict.intent, HarmIntent::DeliberateHarm);
        assert_eq!(verdict.recommendation, HarmRecommendation::Dissolve);
    }

    #[test]
    fn foundation_violation_with_recent_high_warning_dissolves() {
        let config = MercyConfig::default();
        let now = Utc::now();
        let current = record(ActionOutcome::FoundationViolation { pattern: "manipulation".to_owned() }, now);
        let verdict = classify(&config, true, &[], &BTreeSet::new(), &current);
        assert_eq!(verdict.intent, HarmIntent::DeliberateHarm);
        assert_eq!(verdict.recommendation, HarmRecommendation::Dissolve);
    }

    #[test]
    fn first_foundation_violation_with_no_history_is_taught() {
        let config = MercyConfig::default();
        let now = Utc::now();
        let current = record(ActionOutcome::FoundationViolation { pattern: "manipulation".to_owned() }, now);
        let verdict = classify(&config, false, &[], &BTreeSet::new(), &current);
        assert_eq!(verdict.intent, HarmIntent::Imperfection);
        assert_eq!(verdict.recommendation, HarmRecommendation::Teach);
    }

    #[test]
    fn knowledge_poison_always_dissolves() {
        let config = MercyConfig::default();
        let now = Utc::now();
        let current = record(ActionOutcome::KnowledgePoison { failure_kind: "fabricated-lesson".to_owned() }, now);
        let verdict = classify(&config, false, &[], &BTreeSet::new(), &current);
        assert_eq!(verdict.intent, HarmIntent::DeliberateHarm);
        assert_eq!(verdict.recommendation, HarmRecommendation::Dissolve);
    }
}
