pub mod search;
pub mod sources;

use crate::cli::TuningArgs;
use polysearch_core::error::SearchError;
use polysearch_core::federated::{SearchSettings, SettingsStore};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Process exit code: 2 for bad input, 3 when the search was cut short.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Search(e) if e.is_configuration() => 2,
            CommandError::Search(SearchError::OrchestrationTimeout { .. } | SearchError::Cancelled) => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Settings from file, with command-line overrides applied on top.
pub fn load_settings(tuning: &TuningArgs) -> Result<SearchSettings> {
    let store = SettingsStore::locate(tuning.config.clone());
    let mut settings = store.load()?;

    if let Some(ms) = tuning.timeout_ms {
        settings.per_source_timeout_ms = ms;
    }
    if let Some(ms) = tuning.global_timeout_ms {
        settings.global_timeout_ms = ms;
    }
    if let Some(n) = tuning.max_in_flight {
        settings.max_in_flight = n;
    }
    settings.validate()?;
    Ok(settings)
}
