//! End-to-end acceptance scenarios exercised against the public
//! [`kiln_mercy`] API, one generation's worth of wall-clock at a time.

use chrono::{Duration, Utc};
use kiln_mercy::{MercyConfig, MercyMachine};
use kiln_types::{AgentId, MercyState, Warning, WarningId, WarningSeverity};

fn low_warning(issued_at: chrono::DateTime<Utc>) -> Warning {
    Warning {
        id: WarningId::new(),
        agent_id: AgentId::new(),
        virtue_id: None,
        severity: WarningSeverity::Low,
        reason: "stimulus escaped capture".to_owned(),
        issued_at,
        expires_at: issued_at + Duration::hours(24),
    }
}

/// S4: a `Low` warning issued at `t=0` with the default 24h decay is
/// still active one second short of 24 hours, and has fully expired one
/// second past it -- regressing the agent from `Caution` back to `Good`.
#[test]
fn warning_decay_regresses_state_after_24_hours() {
    let mut machine = MercyMachine::new(MercyConfig::default());
    let agent = AgentId::new();
    let issued_at = Utc::now();

    machine.issue_warning(agent, low_warning(issued_at));
    assert_eq!(machine.state(agent), MercyState::Caution);

    let just_under = issued_at + Duration::hours(23) + Duration::minutes(59);
    machine.expire_warnings(agent, just_under).expect("agent has a record");
    assert_eq!(machine.record(agent).expect("record present").active_warnings().len(), 1);
    assert_eq!(machine.state(agent), MercyState::Caution);

    let just_over = issued_at + Duration::hours(24) + Duration::seconds(1);
    machine.expire_warnings(agent, just_over).expect("agent has a record");
    assert_eq!(machine.record(agent).expect("record present").active_warnings().len(), 0);
    assert_eq!(machine.state(agent), MercyState::Good);
}
