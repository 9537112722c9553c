// src/lib.rs
pub mod category;
pub mod classifier;
pub mod connectors;
pub mod error;
pub mod federated;
pub mod qualifiers;
pub mod registry;

use crate::classifier::Classifier;
use crate::error::{SearchError, SourceFailure};
use crate::federated::{
    consolidate, planned_names, DispatchPlan, FederatedSearch, ResultRecord, SearchReport,
    SearchSettings, SourceQuery, TopN,
};
use crate::qualifiers::{parse_query, RawQualifiers};
use crate::registry::{builtin_sources, Engine, SourceRegistry};
use async_trait::async_trait;
use std::time::Instant;
use tracing::debug;

pub use crate::category::Category;
pub use tokio_util::sync::CancellationToken;

/// A searchable source.
///
/// Each adapter receives its own copy of the query and qualifiers and
/// translates them into its own protocol.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Returns the name of the adapter.
    fn name(&self) -> &str;

    async fn search(&self, request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure>;
}

/// Build a registry with every built-in source.
///
/// Sources whose connector feature is disabled are still listed but fail
/// as unavailable. Weight overrides from `settings` are applied here.
pub fn build_registry(engine: Engine, settings: &SearchSettings) -> Result<SourceRegistry, SearchError> {
    let client = connectors::http_client()?;
    let mut registry = SourceRegistry::new(engine);
    for descriptor in builtin_sources() {
        let adapter = connectors::adapter_for(descriptor, engine, &client);
        registry.register(descriptor.clone(), adapter);
    }
    registry.apply_weights(&settings.weights);
    Ok(registry)
}

/// One search invocation, as the user asked for it.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    /// Qualifiers given as explicit flags; these win over inline ones
    pub qualifiers: RawQualifiers,
    pub category: Option<Category>,
    pub include_general: bool,
    /// Unvalidated; must be positive
    pub top_n: i64,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, top_n: i64) -> Self {
        Self {
            query: query.into(),
            top_n,
            ..Self::default()
        }
    }
}

/// Classify, fan out, consolidate.
///
/// Configuration problems are reported before any source is contacted.
/// Individual source failures are not errors; they are listed in the
/// report's `sources`.
pub async fn search(
    request: &SearchRequest,
    registry: &SourceRegistry,
    settings: &SearchSettings,
    cancel: &CancellationToken,
) -> Result<SearchReport, SearchError> {
    let started = Instant::now();

    let top_n = TopN::new(request.top_n)?;
    settings.validate()?;
    let parsed = parse_query(&request.query, &request.qualifiers)?;

    let resolution = Classifier::default().resolve(
        &parsed.base_query,
        &parsed.qualifiers,
        request.category,
        request.include_general,
    );

    let source_query = SourceQuery::new(
        parsed.base_query.clone(),
        parsed.qualifiers.clone(),
        settings.limit_for(top_n.get()),
    );
    let mut plan = DispatchPlan::build(source_query, &resolution.categories, registry);
    if !parsed.qualifiers.is_empty() && plan.add_qualifier_pass(registry) {
        debug!(engine = %registry.engine(), "qualifiers given; web engine added");
    }
    debug!(
        query = %parsed.base_query,
        categories = ?resolution.categories,
        sources = ?planned_names(&plan),
        "dispatch plan ready"
    );

    let outcomes = FederatedSearch::new(settings).dispatch(&plan, cancel).await?;
    let results = consolidate(&outcomes, &parsed.qualifiers, top_n);

    Ok(SearchReport {
        query: request.query.clone(),
        base_query: parsed.base_query,
        qualifiers: parsed.qualifiers,
        resolution,
        results,
        sources: outcomes.iter().map(|o| o.report()).collect(),
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}
