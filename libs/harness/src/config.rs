//! Harness configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use labsync_model::{IdentityError, InstrumentType};
use labsync_reconcile::PollPolicy;

/// Polling policies and scenario-wide switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Policy for ordinary convergence waits.
    pub poll: PollPolicy,

    /// Policy while a created instrument starts up.
    pub provision_poll: PollPolicy,

    /// Running unattended (CI). Enables warnings for races a human operator
    /// would shrug off.
    pub automated: bool,

    /// Types left alone by the reset stop-waiting sweep.
    pub reset_excluded_types: Vec<InstrumentType>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            provision_poll: PollPolicy::provisioning(),
            automated: false,
            reset_excluded_types: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let poll = PollPolicy::new(
            Duration::from_millis(env_u64(
                "LABSYNC_POLL_INTERVAL_MS",
                defaults.poll.interval.as_millis() as u64,
            )?),
            Duration::from_secs(env_u64(
                "LABSYNC_POLL_TIMEOUT_SECS",
                defaults.poll.timeout.as_secs(),
            )?),
        );

        let provision_poll = PollPolicy::new(
            Duration::from_millis(env_u64(
                "LABSYNC_PROVISION_POLL_INTERVAL_MS",
                defaults.provision_poll.interval.as_millis() as u64,
            )?),
            Duration::from_secs(env_u64(
                "LABSYNC_PROVISION_TIMEOUT_SECS",
                defaults.provision_poll.timeout.as_secs(),
            )?),
        );

        let automated = ["LABSYNC_AUTOMATED", "CI"]
            .into_iter()
            .filter_map(|name| std::env::var(name).ok())
            .any(|value| is_truthy(&value));

        let reset_excluded_types = match std::env::var("LABSYNC_RESET_EXCLUDE") {
            Ok(value) => parse_type_list(&value).context("LABSYNC_RESET_EXCLUDE")?,
            Err(_) => defaults.reset_excluded_types,
        };

        Ok(Self {
            poll,
            provision_poll,
            automated,
            reset_excluded_types,
        })
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().parse::<u64>())
        .transpose()
        .with_context(|| format!("{name} must be a non-negative integer."))
        .map(|v| v.unwrap_or(default))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Parse a comma-separated list of management-service type names.
fn parse_type_list(value: &str) -> Result<Vec<InstrumentType>, IdentityError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<InstrumentType>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_config_default() {
        let config = HarnessConfig::default();
        assert!(config.provision_poll.timeout > config.poll.timeout);
        assert!(!config.automated);
        assert!(config.reset_excluded_types.is_empty());
    }

    #[rstest]
    #[case("1", true)]
    #[case("true", true)]
    #[case(" TRUE ", true)]
    #[case("yes", true)]
    #[case("0", false)]
    #[case("false", false)]
    #[case("", false)]
    fn test_is_truthy(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_truthy(value), expected);
    }

    #[test]
    fn test_parse_type_list() {
        let types = parse_type_list("UrineAnalyzer, referencelabinterface,,").unwrap();
        assert_eq!(
            types,
            vec![
                InstrumentType::UrineAnalyzer,
                InstrumentType::ReferenceLabInterface
            ]
        );
        assert!(parse_type_list("").unwrap().is_empty());
        assert!(parse_type_list("UrineAnalyzer,Centrifuge").is_err());
    }
}
