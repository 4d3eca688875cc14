//! Mercy Machine (C6): the warning lifecycle state machine and harm
//! classification that together judge whether an agent's failures
//! reflect imperfection or deliberate harm, and whether it should be
//! taught, warned, or dissolved.

pub mod config;
pub mod error;
pub mod harm;
pub mod invariants;
pub mod state;

pub use config::MercyConfig;
pub use error::MercyError;
pub use harm::{classify, ActionOutcome, ActionRecord};
pub use invariants::check_warning_cap;
pub use state::{MercyMachine, MercyRecord};
