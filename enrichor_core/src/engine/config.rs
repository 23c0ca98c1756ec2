use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::record::{Record, SourceKind};
use crate::retry::RetryPolicy;

/// Engine tuning, passed explicitly to [`super::EnrichmentEngine::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum delay between upstream requests, in seconds.
    #[serde(default = "EngineConfig::default_rate_limit_seconds")]
    pub rate_limit_seconds: f64,

    /// Persist store and checkpoint after this many processed records.
    #[serde(default = "EngineConfig::default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Results with fewer characters than this are treated as not found.
    #[serde(default = "EngineConfig::default_min_content_length")]
    pub min_content_length: usize,

    #[serde(default = "EngineConfig::default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "EngineConfig::default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "EngineConfig::default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Upper bound for a single lookup attempt, in seconds.
    #[serde(default = "EngineConfig::default_lookup_timeout_seconds")]
    pub lookup_timeout_seconds: f64,
}

impl EngineConfig {
    const fn default_rate_limit_seconds() -> f64 {
        1.0
    }

    const fn default_checkpoint_interval() -> usize {
        25
    }

    const fn default_min_content_length() -> usize {
        200
    }

    const fn default_max_retries() -> u32 {
        3
    }

    const fn default_retry_base_delay_ms() -> u64 {
        1000
    }

    const fn default_retry_max_delay_ms() -> u64 {
        30_000
    }

    const fn default_lookup_timeout_seconds() -> f64 {
        30.0
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        positive_duration("rate_limit_seconds", self.rate_limit_seconds)?;
        if self.checkpoint_interval == 0 {
            return Err(Error::config("checkpoint_interval must be at least 1"));
        }
        positive_duration("lookup_timeout_seconds", self.lookup_timeout_seconds)?;
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(Error::config(
                "retry_max_delay_ms must not be smaller than retry_base_delay_ms",
            ));
        }
        Ok(())
    }

    /// Saturates to `Duration::MAX` for values [`Self::validate`] rejects.
    #[must_use]
    pub fn rate_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit_seconds).unwrap_or(Duration::MAX)
    }

    /// Saturates to `Duration::MAX` for values [`Self::validate`] rejects.
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.lookup_timeout_seconds).unwrap_or(Duration::MAX)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}

/// A strictly positive number of seconds that fits in a `Duration`.
fn positive_duration(field: &str, seconds: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        Ok(_) => Err(Error::config(format!(
            "{field} must be positive, got {seconds}"
        ))),
        Err(e) => Err(Error::config(format!(
            "{field} is not a usable duration ({seconds}): {e}"
        ))),
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_limit_seconds: Self::default_rate_limit_seconds(),
            checkpoint_interval: Self::default_checkpoint_interval(),
            min_content_length: Self::default_min_content_length(),
            max_retries: Self::default_max_retries(),
            retry_base_delay_ms: Self::default_retry_base_delay_ms(),
            retry_max_delay_ms: Self::default_retry_max_delay_ms(),
            lookup_timeout_seconds: Self::default_lookup_timeout_seconds(),
        }
    }
}

/// Which already-checked records a run processes again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecheckPolicy {
    #[default]
    Off,
    NotFound,
    All,
}

impl RecheckPolicy {
    /// Whether `record` is due for another lookup in a run that started at
    /// `run_started_at`. Records already re-checked by this run are not.
    #[must_use]
    pub fn selects(self, record: &Record, run_started_at: DateTime<Utc>) -> bool {
        if record
            .checked_at
            .is_some_and(|checked_at| checked_at >= run_started_at)
        {
            return false;
        }
        match self {
            Self::Off => false,
            Self::NotFound => record.source_kind == Some(SourceKind::NotFound),
            Self::All => true,
        }
    }
}

impl FromStr for RecheckPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "off" | "none" => Ok(Self::Off),
            "not-found" | "not_found" => Ok(Self::NotFound),
            "all" => Ok(Self::All),
            other => Err(Error::config(format!("unknown recheck policy: {other}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.checkpoint_interval, 25);
        assert_eq!(config.rate_limit(), Duration::from_secs(1));
    }

    #[test]
    fn test_non_positive_rate_limit_rejected() {
        for bad in [0.0, -1.0, f64::NAN] {
            let config = EngineConfig {
                rate_limit_seconds: bad,
                ..EngineConfig::default()
            };
            assert!(config.validate().unwrap_err().is_configuration());
        }
    }

    #[test]
    fn test_oversized_durations_rejected() {
        for bad in [1e30, f64::INFINITY] {
            let config = EngineConfig {
                lookup_timeout_seconds: bad,
                ..EngineConfig::default()
            };
            assert!(config.validate().unwrap_err().is_configuration());
            assert_eq!(config.lookup_timeout(), Duration::MAX);

            let config = EngineConfig {
                rate_limit_seconds: bad,
                ..EngineConfig::default()
            };
            assert!(config.validate().unwrap_err().is_configuration());
            assert_eq!(config.rate_limit(), Duration::MAX);
        }
    }

    #[test]
    fn test_zero_checkpoint_interval_rejected() {
        let config = EngineConfig {
            checkpoint_interval: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"rate_limit_seconds": 0.5, "max_retries": 1}"#).unwrap();
        assert!((config.rate_limit_seconds - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.min_content_length, 200);
    }

    #[test]
    fn test_recheck_policy_selection() {
        let run_started_at = Utc::now();
        let earlier = run_started_at - chrono::Duration::hours(1);

        let mut not_found = Record::new("a", "Ann Lee");
        not_found.mark_not_found(earlier);
        let mut found = Record::new("b", "Bo Li");
        found.mark_found("bio".into(), "label".into(), earlier);

        assert!(!RecheckPolicy::Off.selects(&not_found, run_started_at));
        assert!(RecheckPolicy::NotFound.selects(&not_found, run_started_at));
        assert!(!RecheckPolicy::NotFound.selects(&found, run_started_at));
        assert!(RecheckPolicy::All.selects(&found, run_started_at));

        not_found.mark_not_found(run_started_at);
        assert!(!RecheckPolicy::All.selects(&not_found, run_started_at));
    }

    #[test]
    fn test_recheck_policy_from_str() {
        assert_eq!(
            "not-found".parse::<RecheckPolicy>().unwrap(),
            RecheckPolicy::NotFound
        );
        assert_eq!("all".parse::<RecheckPolicy>().unwrap(), RecheckPolicy::All);
        assert!("sometimes".parse::<RecheckPolicy>().is_err());
    }
}
