//! Lifecycle configuration.
//!
//! # Responsibility
//! - Hold the retention window and sweep interval used at wiring time.
//! - Load overrides from a JSON document, falling back to defaults for
//!   missing fields.
//!
//! # Invariants
//! - A validated config never has a zero retention or zero interval.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SECONDS_PER_HOUR: u64 = 60 * 60;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_SWEEP_INTERVAL_HOURS: u32 = 24;

/// Errors from loading or validating lifecycle configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    ZeroRetention,
    ZeroSweepInterval,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::ZeroRetention => write!(f, "retention_days must be greater than zero"),
            Self::ZeroSweepInterval => {
                write!(f, "sweep_interval_hours must be greater than zero")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::ZeroRetention | Self::ZeroSweepInterval => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Retention and scheduling knobs for trash cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Days a soft-deleted record stays restorable before the sweep purges it.
    pub retention_days: u32,
    /// Hours between unattended sweeps.
    pub sweep_interval_hours: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            sweep_interval_hours: DEFAULT_SWEEP_INTERVAL_HOURS,
        }
    }
}

impl LifecycleConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&document)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_days == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        if self.sweep_interval_hours == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * SECONDS_PER_DAY)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sweep_interval_hours) * SECONDS_PER_HOUR)
    }
}
