//! Search settings and their YAML store.
//!
//! Settings live in `<config_dir>/polysearch/settings.yaml` unless a path is
//! given explicitly. Every field is optional in the file.
//!
//! ```yaml
//! per_source_timeout_ms: 8000
//! global_timeout_ms: 20000
//! max_in_flight: 6
//! weights:
//!   reddit: 0.7
//!   arxiv: 2.0
//! ```

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Tunables for one search invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Timeout for each source, counted from when it starts running (ms)
    pub per_source_timeout_ms: u64,

    /// Deadline for the whole fan-out (ms)
    pub global_timeout_ms: u64,

    /// Maximum number of sources queried at once
    pub max_in_flight: usize,

    /// Results requested from each source (defaults to top-n)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_source_limit: Option<usize>,

    /// Trust weight overrides by source name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, f64>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            per_source_timeout_ms: 10_000,
            global_timeout_ms: 30_000,
            max_in_flight: 4,
            per_source_limit: None,
            weights: BTreeMap::new(),
        }
    }
}

impl SearchSettings {
    pub fn per_source_timeout(&self) -> Duration {
        Duration::from_millis(self.per_source_timeout_ms)
    }

    pub fn global_timeout(&self) -> Duration {
        Duration::from_millis(self.global_timeout_ms)
    }

    /// Results to ask each source for, given the final top-n.
    pub fn limit_for(&self, top_n: usize) -> usize {
        self.per_source_limit.unwrap_or(top_n).max(1)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.per_source_timeout_ms == 0 {
            return Err(SearchError::config("per_source_timeout_ms must be greater than 0"));
        }
        if self.global_timeout_ms == 0 {
            return Err(SearchError::config("global_timeout_ms must be greater than 0"));
        }
        if self.max_in_flight == 0 {
            return Err(SearchError::config("max_in_flight must be greater than 0"));
        }
        if self.per_source_limit == Some(0) {
            return Err(SearchError::config("per_source_limit must be greater than 0"));
        }
        for (source, weight) in &self.weights {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(SearchError::config(format!(
                    "weight for '{}' must be a positive number, got {}",
                    source, weight
                )));
            }
        }
        Ok(())
    }
}

/// Where settings are read from.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    explicit: bool,
}

impl SettingsStore {
    /// Store at the default location. A missing file means defaults.
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("polysearch").join("settings.yaml"),
            explicit: false,
        }
    }

    /// Store at a path the user asked for. A missing file is an error.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            explicit: true,
        }
    }

    /// Explicit path if given, default location otherwise.
    pub fn locate(explicit: Option<PathBuf>) -> Self {
        explicit.map_or_else(Self::new_default, Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<SearchSettings, SearchError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.explicit => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                return Ok(SearchSettings::default());
            }
            Err(e) => {
                return Err(SearchError::Settings(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let settings: SearchSettings = if content.trim().is_empty() {
            SearchSettings::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                SearchError::Settings(format!("invalid {}: {}", self.path.display(), e))
            })?
        };

        settings.validate()?;
        debug!(path = %self.path.display(), "loaded settings");
        Ok(settings)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new_default()
    }
}
