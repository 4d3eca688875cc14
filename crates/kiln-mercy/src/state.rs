//! The warning lifecycle state machine: one [`MercyRecord`] per agent,
//! held by the [`MercyMachine`]'s single-threaded scheduler (§5
//! Shared-resource policy).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kiln_types::{AgentId, MercyState, Warning, WarningSeverity};

use crate::config::MercyConfig;
use crate::error::MercyError;

/// Per-agent warning history and derived Mercy state.
///
/// `state` is always the ladder position implied by `warnings.len()`
/// (capped at `Dissolution`), except once `dissolved` is set, at which
/// point it is the terminal `Dissolved` and no further transitions apply.
#[derive(Debug, Clone)]
pub struct MercyRecord {
    agent_id: AgentId,
    warnings: Vec<Warning>,
    dissolved: bool,
    /// Generations remaining in the one-generation dissolution grace
    /// period (§4.6: a Medium warning received while already at
    /// `Dissolution` starts this countdown). `None` when no grace period
    /// is in force.
    grace_remaining: Option<u32>,
}

impl MercyRecord {
    /// Create a fresh record with no warnings.
    pub const fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            warnings: Vec::new(),
            dissolved: false,
            grace_remaining: None,
        }
    }

    /// The agent this record tracks.
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// The current Mercy state, derived from the active warning count.
    pub fn state(&self, max_warnings: u8) -> MercyState {
        if self.dissolved {
            return MercyState::Dissolved;
        }
        let count = u8::try_from(self.warnings.len()).unwrap_or(u8::MAX).min(max_warnings);
        MercyState::from_count(count)
    }

    /// Active warnings currently held against this agent.
    pub fn active_warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Whether this agent is terminally dissolved.
    pub const fn is_dissolved(&self) -> bool {
        self.dissolved
    }

    /// Whether a one-generation dissolution grace period is in force.
    pub const fn grace_remaining(&self) -> Option<u32> {
        self.grace_remaining
    }
}

/// The Mercy Machine (C6): owns every agent's warning history and applies
/// the warning-ladder and dissolution transition rules.
#[derive(Debug, Clone, Default)]
pub struct MercyMachine {
    config: MercyConfig,
    records: BTreeMap<AgentId, MercyRecord>,
}

impl MercyMachine {
    /// Create a machine with the given configuration.
    pub fn new(config: MercyConfig) -> Self {
        Self {
            config,
            records: BTreeMap::new(),
        }
    }

    /// The machine's configuration.
    pub const fn config(&self) -> &MercyConfig {
        &self.config
    }

    /// Fetch or lazily create the record for `agent_id`.
    fn record_mut(&mut self, agent_id: AgentId) -> &mut MercyRecord {
        self.records.entry(agent_id).or_insert_with(|| MercyRecord::new(agent_id))
    }

    /// The current Mercy state for `agent_id` (`Good` if no record yet).
    pub fn state(&self, agent_id: AgentId) -> MercyState {
        self.records.get(&agent_id).map_or(MercyState::Good, |r| r.state(self.config.max_warnings))
    }

    /// Issue a `Low` or `Medium` warning against `agent_id`.
    ///
    /// Advances one ladder step unless the agent is already at
    /// `Dissolution`, in which case the warning is not added (I6's cap),
    /// but a `Medium` warning at `Dissolution` starts the one-generation
    /// dissolution grace countdown if it is not already running.
    ///
    /// For a `High` warning that reflects deliberate trust-poisoning, use
    /// [`Self::dissolve`] directly instead -- that transition bypasses the
    /// ladder entirely (§4.6).
    pub fn issue_warning(&mut self, agent_id: AgentId, warning: Warning) {
        debug_assert_ne!(warning.severity, WarningSeverity::High, "High warnings that deliberately poison trust dissolve directly; route through `dissolve`");
        let max_warnings = self.config.max_warnings;
        let record = self.record_mut(agent_id);
        if record.dissolved {
            return;
        }

        let at_cap = u8::try_from(record.warnings.len()).unwrap_or(u8::MAX) >= max_warnings;
        if at_cap {
            if warning.severity == WarningSeverity::Medium && record.grace_remaining.is_none() {
                record.grace_remaining = Some(1);
                tracing::info!(agent = %agent_id, "dissolution grace period started");
            }
            return;
        }
        record.warnings.push(warning);
    }

    /// Jump an agent straight to `Dissolved`, bypassing the ladder. Used
    /// for a `High` warning reflecting deliberate trust-poisoning, or when
    /// a dissolution grace period expires.
    pub fn dissolve(&mut self, agent_id: AgentId) {
        let record = self.record_mut(agent_id);
        record.dissolved = true;
        record.warnings.clear();
        record.grace_remaining = None;
    }

    /// Expire every warning on `agent_id` whose `expires_at` has passed,
    /// regressing the ladder one step per expired warning.
    ///
    /// # Errors
    ///
    /// Returns [`MercyError::UnknownAgent`] if no record exists for
    /// `agent_id`.
    pub fn expire_warnings(&mut self, agent_id: AgentId, now: DateTime<Utc>) -> Result<u32, MercyError> {
        let record = self.records.get_mut(&agent_id).ok_or(MercyError::UnknownAgent { agent_id })?;
        if record.dissolved {
            return Ok(0);
        }
        let before = record.warnings.len();
        record.warnings.retain(|w| w.is_active_at(now));
        #[allow(clippy::arithmetic_side_effects)]
        let expired = before - record.warnings.len();
        Ok(u32::try_from(expired).unwrap_or(u32::MAX))
    }

    /// Apply growth clearance: on a `Coherent` or `Growing` verdict while
    /// the agent's state is above `Good`, clear its oldest active
    /// warning and, if it was at `Dissolution`, reset the grace-period
    /// counter (§4.6, P8).
    ///
    /// Returns `true` if a warning was cleared.
    pub fn clear_for_growth(&mut self, agent_id: AgentId) -> bool {
        let Some(record) = self.records.get_mut(&agent_id) else {
            return false;
        };
        if record.dissolved || record.warnings.is_empty() {
            return false;
        }
        record.warnings.remove(0);
        record.grace_remaining = None;
        true
    }

    /// Advance the one-generation dissolution grace countdown for every
    /// agent currently running one. Called once per Kiln generation
    /// (§4.7 step 1, "expire warnings").
    ///
    /// Returns the ids of agents whose grace period just expired and who
    /// are therefore dissolved by this call.
    pub fn tick_grace_periods(&mut self) -> Vec<AgentId> {
        let mut dissolved = Vec::new();
        for (&agent_id, record) in &mut self.records {
            let Some(remaining) = record.grace_remaining else {
                continue;
            };
            if remaining <= 1 {
                record.dissolved = true;
                record.warnings.clear();
                record.grace_remaining = None;
                dissolved.push(agent_id);
            } else {
                #[allow(clippy::arithmetic_side_effects)]
                {
                    record.grace_remaining = Some(remaining - 1);
                }
            }
        }
        dissolved
    }

    /// Fetch the record for `agent_id`, if one exists.
    pub fn record(&self, agent_id: AgentId) -> Option<&MercyRecord> {
        self.records.get(&agent_id)
    }

    /// Every record currently held, in `AgentId` order. Used by session
    /// persistence to snapshot the machine.
    pub fn all_records(&self) -> impl Iterator<Item = &MercyRecord> {
        self.records.values()
    }

    /// Remove the record for a dissolved or garbage-collected agent.
    /// Warnings are owned by the Mercy Machine and do not outlive the
    /// agent (unlike Lessons and Pathways, salvaged separately to C5).
    pub fn forget(&mut self, agent_id: AgentId) {
        self.records.remove(&agent_id);
    }

    /// Reinstall a record exactly as previously observed, bypassing the
    /// ladder rules `issue_warning` enforces. Used only by session
    /// persistence to rebuild machine state from a serialized snapshot
    /// that was already valid when it was captured.
    pub fn restore_record(&mut self, agent_id: AgentId, warnings: Vec<Warning>, dissolved: bool, grace_remaining: Option<u32>) {
        self.records.insert(
            agent_id,
            MercyRecord {
                agent_id,
                warnings,
                dissolved,
                grace_remaining,
            },
        );
    }
}
