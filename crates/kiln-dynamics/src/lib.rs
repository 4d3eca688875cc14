//! Activation dynamics (C3): spread and capture, Hebbian and anti-Hebbian
//! update, decay, perturbation, and self-healing over a single agent's
//! [`kiln_graph::TopologyOverlay`].
//!
//! Maintenance passes (decay, perturbation, healing) are exposed as
//! individually callable functions rather than bundled into one tick --
//! the engine orchestrates their cadence.

pub mod config;
pub mod decay;
pub mod error;
pub mod heal;
pub mod hebbian;
pub mod perturb;
pub mod spread;

pub use config::DynamicsConfig;
pub use error::DynamicsError;
pub use spread::{run_trajectory, RunOutcome};
