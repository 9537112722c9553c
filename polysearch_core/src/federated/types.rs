//! Core types for federated search results.

use crate::category::Category;
use crate::classifier::Resolution;
use crate::error::SourceFailure;
use crate::qualifiers::QualifierSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Federation metadata attached to each result for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationMeta {
    /// Original rank within source (1-indexed, before merge)
    pub source_rank: usize,

    /// Position in the flattened dispatch-order sequence (0-indexed)
    #[serde(default)]
    pub arrival: usize,

    /// Trust weight of the originating source
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Computed rank score (higher = better)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for FederationMeta {
    fn default() -> Self {
        Self::new(1)
    }
}

impl FederationMeta {
    /// Create federation metadata for a result at the given rank.
    pub fn new(source_rank: usize) -> Self {
        Self {
            source_rank,
            arrival: 0,
            weight: 1.0,
            score: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// A normalized search result from any source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Source name (e.g., "arxiv", "reuters")
    pub source: String,

    /// Category the source was searched under
    pub category: Category,

    pub title: String,

    /// Identity of the record; compared after normalization
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Publication date, when the source reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<NaiveDate>,

    /// The source's own relevance signal, if it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,

    /// Federation tracking metadata
    #[serde(rename = "_federation")]
    pub federation: FederationMeta,
}

impl ResultRecord {
    /// Create a new record with required fields.
    ///
    /// Category and trust weight are stamped by the orchestrator.
    pub fn new(source: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            category: Category::General,
            title: title.into(),
            url: url.into(),
            snippet: None,
            published: None,
            relevance: None,
            federation: FederationMeta::default(),
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        let snippet = snippet.into();
        if !snippet.trim().is_empty() {
            self.snippet = Some(snippet);
        }
        self
    }

    pub fn with_published(mut self, published: NaiveDate) -> Self {
        self.published = Some(published);
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.federation.weight = weight;
        self
    }

    pub fn score(&self) -> f64 {
        self.federation.score()
    }
}

/// What every adapter receives: its own copy of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    pub query: String,
    pub qualifiers: QualifierSet,
    /// Maximum number of records wanted from this source
    pub limit: usize,
}

impl SourceQuery {
    pub fn new(query: impl Into<String>, qualifiers: QualifierSet, limit: usize) -> Self {
        Self {
            query: query.into(),
            qualifiers,
            limit: limit.max(1),
        }
    }
}

/// Result of invoking one source.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: String,
    pub category: Category,
    pub weight: f64,
    /// Time spent in the adapter call (ms), excluding queueing
    pub elapsed_ms: u64,
    pub result: Result<Vec<ResultRecord>, SourceFailure>,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn report(&self) -> SourceReport {
        match &self.result {
            Ok(records) => SourceReport {
                source: self.source.clone(),
                category: self.category,
                count: records.len(),
                elapsed_ms: self.elapsed_ms,
                failure: None,
            },
            Err(failure) => SourceReport {
                source: self.source.clone(),
                category: self.category,
                count: 0,
                elapsed_ms: self.elapsed_ms,
                failure: Some(failure.clone()),
            },
        }
    }
}

/// Per-source summary kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    pub category: Category,
    pub count: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SourceFailure>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// Deduplicated, filtered, ranked and truncated results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedList {
    pub results: Vec<ResultRecord>,
    /// Records merged into a higher-priority duplicate
    #[serde(default)]
    pub duplicates: usize,
    /// Records dropped by the date filter
    #[serde(default)]
    pub filtered_out: usize,
}

impl ConsolidatedList {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Everything one invocation produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    /// The query as typed
    pub query: String,

    /// Query text with qualifiers removed
    pub base_query: String,

    #[serde(default)]
    pub qualifiers: QualifierSet,

    pub resolution: Resolution,

    pub results: ConsolidatedList,

    /// One entry per dispatched source, in dispatch order
    #[serde(default)]
    pub sources: Vec<SourceReport>,

    /// Total time taken (ms)
    pub duration_ms: u64,
}

impl SearchReport {
    /// Check if any sources failed.
    pub fn has_errors(&self) -> bool {
        self.sources.iter().any(|s| !s.is_ok())
    }

    /// Every dispatched source failed (as opposed to finding nothing).
    pub fn all_sources_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| !s.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.is_ok())
    }
}
