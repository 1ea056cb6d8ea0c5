use chrono::Duration;
use serde::Deserialize;

use crate::error::SessionError;

/// Reconciliation timing knobs.
///
/// The original timings were observed constants; here they are explicit
/// parameters with the observed values as defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// How long after a local mutation background refresh is withheld, so a
    /// server read racing the mutation cannot flicker stale rows in.
    #[serde(default = "default_suppression_ms")]
    pub suppression_ms: u64,
    /// How long after a local mutation to wait for server confirmation
    /// before the overlay expires.
    #[serde(default = "default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    /// Background refresh cadence.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

fn default_suppression_ms() -> u64 {
    2_500
}

fn default_confirm_timeout_ms() -> u64 {
    8_000
}

fn default_refresh_interval_ms() -> u64 {
    5_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            suppression_ms: default_suppression_ms(),
            confirm_timeout_ms: default_confirm_timeout_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml(input: &str) -> Result<Self, SessionError> {
        let config: SessionConfig =
            toml::from_str(input).map_err(|e| SessionError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.suppression_ms == 0 || self.confirm_timeout_ms == 0 || self.refresh_interval_ms == 0
        {
            return Err(SessionError::ConfigValidation(
                "timing parameters must be positive".into(),
            ));
        }
        if self.confirm_timeout_ms <= self.suppression_ms {
            return Err(SessionError::ConfigValidation(format!(
                "confirm_timeout_ms ({}) must exceed suppression_ms ({})",
                self.confirm_timeout_ms, self.suppression_ms
            )));
        }
        Ok(())
    }

    pub fn suppression(&self) -> Duration {
        Duration::milliseconds(self.suppression_ms as i64)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::milliseconds(self.confirm_timeout_ms as i64)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::milliseconds(self.refresh_interval_ms as i64)
    }
}
