use std::{collections::HashMap, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

const DEFAULT_REFRESH_RATE: f64 = 2.0;
const DEFAULT_READER_REFRESH_RATE: f64 = 5.0;

/// Seconds as a duration. Non-positive or non-finite values use `default`.
fn secs_or(secs: f64, default: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => d,
        _ => Duration::from_secs_f64(default),
    }
}

/// Refresh and retry settings shared by every view-model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Seconds between two table refreshes.
    pub refresh_rate: f64,
    /// Milliseconds before the first background refresh.
    pub initial_refresh: u64,
    /// Seconds between two refreshes of the line viewers.
    pub reader_refresh_rate: f64,
    pub backoff: BackoffConfig,
    /// Custom layouts keyed by resource kind.
    pub views: HashMap<String, ViewSetting>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            refresh_rate: DEFAULT_REFRESH_RATE,
            initial_refresh: 300,
            reader_refresh_rate: DEFAULT_READER_REFRESH_RATE,
            backoff: BackoffConfig::default(),
            views: HashMap::new(),
        }
    }
}

impl ModelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg: ModelConfig = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if !(self.refresh_rate.is_finite() && self.refresh_rate > 0.0) {
            return Err(ModelError::Config(format!(
                "refresh_rate must be positive, got {}",
                self.refresh_rate
            )));
        }
        if !(self.reader_refresh_rate.is_finite() && self.reader_refresh_rate > 0.0) {
            return Err(ModelError::Config(format!(
                "reader_refresh_rate must be positive, got {}",
                self.reader_refresh_rate
            )));
        }
        if self.backoff.initial_interval_ms == 0 {
            return Err(ModelError::Config(
                "backoff initial_interval_ms must be positive".into(),
            ));
        }
        if self.backoff.max_interval_secs == 0 {
            return Err(ModelError::Config(
                "backoff max_interval_secs must be positive".into(),
            ));
        }
        if !(self.backoff.multiplier.is_finite() && self.backoff.multiplier >= 1.0) {
            return Err(ModelError::Config(format!(
                "backoff multiplier must be >= 1, got {}",
                self.backoff.multiplier
            )));
        }
        Ok(())
    }

    pub fn refresh_rate(&self) -> Duration {
        secs_or(self.refresh_rate, DEFAULT_REFRESH_RATE)
    }

    pub fn initial_refresh(&self) -> Duration {
        Duration::from_millis(self.initial_refresh)
    }

    pub fn reader_refresh_rate(&self) -> Duration {
        secs_or(self.reader_refresh_rate, DEFAULT_READER_REFRESH_RATE)
    }

    pub fn view_setting(&self, kind: &str) -> Option<&ViewSetting> {
        self.views.get(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_interval_ms: u64,
    pub multiplier: f64,
    pub max_interval_secs: u64,
    /// Give up once this much time passed since the first failure.
    pub max_elapsed_secs: u64,
    /// Give up after this many consecutive failures.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 300,
            multiplier: 1.5,
            max_interval_secs: 60,
            max_elapsed_secs: 120,
            max_attempts: None,
        }
    }
}

/// A custom column layout and default sort for one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSetting {
    pub columns: Vec<String>,
    /// `NAME:asc` or `NAME:desc`.
    pub sort_column: String,
}

impl ViewSetting {
    pub fn is_blank(&self) -> bool {
        self.columns.is_empty() && self.sort_column.is_empty()
    }

    pub fn has_cols(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Parses the sort column into its name and direction (true when ascending).
    pub fn sort_col(&self) -> Result<(String, bool)> {
        if self.sort_column.is_empty() {
            return Err(ModelError::Config("no sort column specified".into()));
        }
        match self.sort_column.split_once(':') {
            Some((name, order)) if !name.is_empty() => Ok((name.to_string(), order == "asc")),
            _ => Err(ModelError::Config(format!(
                "invalid sort column spec {:?}, must be col-name:asc|desc",
                self.sort_column
            ))),
        }
    }
}
