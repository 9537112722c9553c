// src/error.rs
use serde::{Deserialize, Serialize};

/// Fatal errors for a search invocation.
///
/// Anything in here stops the run. Per-source problems are never fatal and
/// are reported as [`SourceFailure`] instead.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Search did not finish within {after_ms}ms")]
    OrchestrationTimeout { after_ms: u64 },

    #[error("Search was cancelled")]
    Cancelled,

    #[error("Settings error: {0}")]
    Settings(String),
}

impl SearchError {
    pub fn config(msg: impl Into<String>) -> Self {
        SearchError::Configuration(msg.into())
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            SearchError::Configuration(_) => "invalid_config",
            SearchError::OrchestrationTimeout { .. } => "deadline_exceeded",
            SearchError::Cancelled => "cancelled",
            SearchError::Settings(_) => "invalid_settings",
        }
    }

    /// True for errors caused by the caller's input rather than by the run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SearchError::Configuration(_) | SearchError::Settings(_)
        )
    }
}

/// Why a single source produced no results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SourceFailure {
    #[error("timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("connector not compiled in: {0}")]
    Unavailable(String),

    #[error("adapter panicked: {0}")]
    Panicked(String),
}

impl SourceFailure {
    pub fn code_str(&self) -> &'static str {
        match self {
            SourceFailure::Timeout { .. } => "timeout",
            SourceFailure::Transport(_) => "upstream_error",
            SourceFailure::MalformedResponse(_) => "parse_error",
            SourceFailure::NotConfigured(_) => "not_configured",
            SourceFailure::Unavailable(_) => "unavailable",
            SourceFailure::Panicked(_) => "internal_error",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceFailure::Timeout { .. })
    }
}

impl From<reqwest::Error> for SourceFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceFailure::MalformedResponse(err.to_string())
        } else {
            SourceFailure::Transport(err.to_string())
        }
    }
}
