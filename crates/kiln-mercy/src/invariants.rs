//! Batch invariant check (I6) over the full warning ladder.
//!
//! `issue_warning` enforces the warning cap one call at a time, and a
//! dissolution grace countdown only ever starts once an agent is already
//! at that cap. `MercyMachine::restore_record` bypasses the ladder
//! entirely to rebuild state from a session snapshot, so this re-verifies
//! both properties hold for records however they arrived.

use crate::error::MercyError;
use crate::state::MercyMachine;

/// Check I6: no agent holds more active warnings than `max_warnings`,
/// and a dissolution grace period is only in force for an agent already
/// at that cap.
///
/// # Errors
///
/// Returns [`MercyError::InvariantBroken`] naming the first agent found
/// violating either property.
pub fn check_warning_cap(machine: &MercyMachine) -> Result<(), MercyError> {
    let max_warnings = usize::from(machine.config().max_warnings);
    for record in machine.all_records() {
        if record.is_dissolved() {
            continue;
        }
        let count = record.active_warnings().len();
        if count > max_warnings {
            return Err(MercyError::InvariantBroken {
                agent_id: record.agent_id(),
                detail: format!("{count} active warnings exceeds max_warnings ({max_warnings})"),
            });
        }
        if record.grace_remaining().is_some() && count < max_warnings {
            return Err(MercyError::InvariantBroken {
                agent_id: record.agent_id(),
                detail: "dissolution grace period running below the warning cap".to_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use kiln_types::{AgentId, Warning, WarningId, WarningSeverity};

    use super::*;
    use crate::config::MercyConfig;

    fn warning(severity: WarningSeverity) -> Warning {
        Warning {
            id: WarningId::new(),
            agent_id: AgentId::new(),
            virtue_id: None,
            severity,
            reason: "test".to_owned(),
            issued_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::hours(24),
        }
    }

    #[test]
    fn a_fresh_machine_has_no_violations() {
        let machine = MercyMachine::new(MercyConfig::default());
        assert!(check_warning_cap(&machine).is_ok());
    }

    #[test]
    fn warnings_within_the_cap_pass() {
        let mut machine = MercyMachine::new(MercyConfig::default());
        let agent = AgentId::new();
        machine.issue_warning(agent, warning(WarningSeverity::Low));
        machine.issue_warning(agent, warning(WarningSeverity::Low));
        assert!(check_warning_cap(&machine).is_ok());
    }

    #[test]
    fn a_reloaded_record_over_the_cap_is_caught() {
        let mut machine = MercyMachine::new(MercyConfig::default());
        let agent = AgentId::new();
        let over_cap = vec![warning(WarningSeverity::Low); 5];
        machine.restore_record(agent, over_cap, false, None);
        let err = check_warning_cap(&machine).unwrap_err();
        assert!(matches!(err, MercyError::InvariantBroken { .. }));
    }

    #[test]
    fn a_grace_period_below_the_cap_is_caught() {
        let mut machine = MercyMachine::new(MercyConfig::default());
        let agent = AgentId::new();
        machine.restore_record(agent, vec![warning(WarningSeverity::Low)], false, Some(1));
        let err = check_warning_cap(&machine).unwrap_err();
        assert!(matches!(err, MercyError::InvariantBroken { .. }));
    }

    #[test]
    fn a_dissolved_agent_is_never_checked() {
        let mut machine = MercyMachine::new(MercyConfig::default());
        let agent = AgentId::new();
        let over_cap = vec![warning(WarningSeverity::Low); 5];
        machine.restore_record(agent, over_cap, true, None);
        assert!(check_warning_cap(&machine).is_ok());
    }
}
