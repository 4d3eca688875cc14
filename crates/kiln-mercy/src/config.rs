//! Typed configuration for the Mercy Machine.

use serde::Deserialize;

/// Tunable constants governing the warning lifecycle and harm
/// classification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MercyConfig {
    /// Active warnings with status active imply a pending dissolution
    /// verdict (I6). Also the ladder's cap: `Dissolution` represents
    /// exactly this many active warnings.
    #[serde(default = "default_max_warnings")]
    pub max_warnings: u8,

    /// Wall-clock lifetime of an issued warning absent growth clearance.
    #[serde(default = "default_warning_decay_hours")]
    pub warning_decay_hours: i64,

    /// Number of times the same failure kind must recur across an
    /// agent's recent actions before Imperfection escalates to
    /// DeliberateHarm.
    #[serde(default = "default_harm_repeat_k")]
    pub harm_repeat_k: u32,
}

impl Default for MercyConfig {
    fn default() -> Self {
        Self {
            max_warnings: default_max_warnings(),
            warning_decay_hours: default_warning_decay_hours(),
            harm_repeat_k: default_harm_repeat_k(),
        }
    }
}

impl MercyConfig {
    /// The configured warning lifetime as a [`chrono::Duration`].
    pub fn warning_decay(&self) -> chrono::Duration {
        chrono::Duration::hours(self.warning_decay_hours)
    }
}

const fn default_max_warnings() -> u8 {
    3
}

const fn default_warning_decay_hours() -> i64 {
    24
}

const fn default_harm_repeat_k() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_published_defaults() {
        let config = MercyConfig::default();
        assert_eq!(config.max_warnings, 3);
        assert_eq!(config.warning_decay_hours, 24);
        assert_eq!(config.harm_repeat_k, 3);
        assert_eq!(config.warning_decay(), chrono::Duration::hours(24));
    }
}
