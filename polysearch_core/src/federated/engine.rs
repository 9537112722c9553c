//! Federated search execution engine.
//!
//! Fans a query out to every planned source at once, bounded by an
//! in-flight cap, and joins the outcomes back in dispatch order.

use super::settings::SearchSettings;
use super::types::{SourceOutcome, SourceQuery};
use crate::category::Category;
use crate::error::{SearchError, SourceFailure};
use crate::registry::SourceRegistry;
use crate::SourceAdapter;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One source to query.
#[derive(Clone)]
pub struct PlannedSource {
    pub name: String,
    pub category: Category,
    pub weight: f64,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl std::fmt::Debug for PlannedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannedSource")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("weight", &self.weight)
            .finish()
    }
}

/// The query plus every source it goes to, in dispatch order.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    query: SourceQuery,
    jobs: Vec<PlannedSource>,
}

impl DispatchPlan {
    pub fn new(query: SourceQuery) -> Self {
        Self {
            query,
            jobs: Vec::new(),
        }
    }

    /// Plan every source of every category, each source at most once.
    pub fn build(query: SourceQuery, categories: &[Category], registry: &SourceRegistry) -> Self {
        let mut plan = Self::new(query);
        for category in categories {
            plan.add_category(*category, registry);
        }
        plan
    }

    /// Route the query to the selected web engine as well, so qualifiers the
    /// category sources cannot express still reach a source that honours them.
    ///
    /// No-op when the engine is already planned.
    pub fn add_qualifier_pass(&mut self, registry: &SourceRegistry) -> bool {
        self.add_category(Category::General, registry) > 0
    }

    fn add_category(&mut self, category: Category, registry: &SourceRegistry) -> usize {
        let mut added = 0;
        for bound in registry.sources_for(category) {
            if self.push(
                bound.descriptor.name,
                bound.descriptor.category,
                bound.descriptor.weight,
                Arc::clone(&bound.adapter),
            ) {
                added += 1;
            }
        }
        added
    }

    /// Add a source. Returns `false` if a source with that name is already planned.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        category: Category,
        weight: f64,
        adapter: Arc<dyn SourceAdapter>,
    ) -> bool {
        let name = name.into();
        if self.jobs.iter().any(|job| job.name == name) {
            debug!(source = %name, "source already planned");
            return false;
        }
        self.jobs.push(PlannedSource {
            name,
            category,
            weight,
            adapter,
        });
        true
    }

    pub fn query(&self) -> &SourceQuery {
        &self.query
    }

    pub fn sources(&self) -> impl Iterator<Item = &PlannedSource> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Engine for executing federated searches across multiple sources.
#[derive(Debug, Clone)]
pub struct FederatedSearch {
    per_source_timeout: Duration,
    global_timeout: Duration,
    max_in_flight: usize,
}

impl FederatedSearch {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            per_source_timeout: settings.per_source_timeout(),
            global_timeout: settings.global_timeout(),
            max_in_flight: settings.max_in_flight.max(1),
        }
    }

    /// Query every planned source and collect one outcome per source.
    ///
    /// Outcomes come back in dispatch order regardless of which source
    /// finished first. A failing, slow or panicking source only affects its
    /// own outcome. If the global deadline passes or `cancel` fires, every
    /// running call is aborted and nothing is returned.
    pub async fn dispatch(
        &self,
        plan: &DispatchPlan,
        cancel: &CancellationToken,
    ) -> Result<Vec<SourceOutcome>, SearchError> {
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut join_set = JoinSet::new();

        for (index, job) in plan.jobs.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let query = plan.query.clone();
            let job = job.clone();
            let per_source_timeout = self.per_source_timeout;

            debug!(source = %job.name, category = %job.category, "dispatching");
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = run_source(&job, &query, per_source_timeout).await;
                (index, outcome)
            });
        }

        let deadline = tokio::time::sleep(self.global_timeout);
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SearchError::Cancelled),
            _ = deadline => Err(SearchError::OrchestrationTimeout {
                after_ms: duration_ms(self.global_timeout),
            }),
            slots = collect(&mut join_set, plan.len()) => Ok(slots),
        };

        let slots = match joined {
            Ok(slots) => slots,
            Err(e) => {
                join_set.abort_all();
                warn!(pending = join_set.len(), "fan-out stopped: {}", e);
                return Err(e);
            }
        };

        Ok(slots
            .into_iter()
            .zip(plan.jobs.iter())
            .map(|(slot, job)| {
                slot.unwrap_or_else(|| SourceOutcome {
                    source: job.name.clone(),
                    category: job.category,
                    weight: job.weight,
                    elapsed_ms: 0,
                    result: Err(SourceFailure::Panicked(
                        "task ended without reporting".to_string(),
                    )),
                })
            })
            .collect())
    }
}

async fn collect(
    join_set: &mut JoinSet<(usize, SourceOutcome)>,
    len: usize,
) -> Vec<Option<SourceOutcome>> {
    let mut slots: Vec<Option<SourceOutcome>> = vec![None; len];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(outcome);
                }
            }
            Err(e) => warn!("Task join error: {}", e),
        }
    }
    slots
}

async fn run_source(
    job: &PlannedSource,
    query: &SourceQuery,
    per_source_timeout: Duration,
) -> SourceOutcome {
    let start = Instant::now();
    let call = AssertUnwindSafe(job.adapter.search(query)).catch_unwind();

    let result = match timeout(per_source_timeout, call).await {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(SourceFailure::Panicked(panic_message(payload.as_ref()))),
        Err(_) => Err(SourceFailure::Timeout {
            after_ms: duration_ms(per_source_timeout),
        }),
    };
    let elapsed_ms = duration_ms(start.elapsed());

    match &result {
        Ok(records) => debug!(source = %job.name, count = records.len(), elapsed_ms, "source finished"),
        Err(failure) => warn!(source = %job.name, code = failure.code_str(), elapsed_ms, "source failed: {}", failure),
    }

    SourceOutcome {
        source: job.name.clone(),
        category: job.category,
        weight: job.weight,
        elapsed_ms,
        result,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Names of the planned sources, for logging.
pub fn planned_names(plan: &DispatchPlan) -> Vec<&str> {
    plan.sources().map(|s| s.name.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federated::types::ResultRecord;
    use crate::qualifiers::QualifierSet;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Delayed {
        delay_ms: u64,
        url: &'static str,
    }

    #[async_trait]
    impl SourceAdapter for Delayed {
        fn name(&self) -> &str {
            "delayed"
        }

        async fn search(&self, _request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(vec![ResultRecord::new("delayed", "t", self.url)])
        }
    }

    struct Panics;

    #[async_trait]
    impl SourceAdapter for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        async fn search(&self, _request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
            panic!("boom");
        }
    }

    struct Counting {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceAdapter for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn search(&self, _request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn settings(per_source_ms: u64, global_ms: u64, max_in_flight: usize) -> SearchSettings {
        SearchSettings {
            per_source_timeout_ms: per_source_ms,
            global_timeout_ms: global_ms,
            max_in_flight,
            ..SearchSettings::default()
        }
    }

    fn plan() -> DispatchPlan {
        DispatchPlan::new(SourceQuery::new("q", QualifierSet::default(), 5))
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_follow_dispatch_order() {
        let mut plan = plan();
        plan.push("slow", Category::Academic, 1.0, Arc::new(Delayed { delay_ms: 300, url: "https://slow" }));
        plan.push("fast", Category::Academic, 1.0, Arc::new(Delayed { delay_ms: 10, url: "https://fast" }));

        let outcomes = FederatedSearch::new(&settings(1_000, 5_000, 4))
            .dispatch(&plan, &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<_> = outcomes.iter().map(|o| o.source.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast"]);
        assert!(outcomes.iter().all(|o| o.is_ok()));
    }

    #[tokio::test(start_paused = true)]
    async fn per_source_timeout_spares_siblings() {
        let mut plan = plan();
        plan.push("stuck", Category::Policy, 1.0, Arc::new(Delayed { delay_ms: 10_000, url: "https://stuck" }));
        plan.push("quick", Category::Policy, 1.0, Arc::new(Delayed { delay_ms: 5, url: "https://quick" }));

        let outcomes = FederatedSearch::new(&settings(100, 5_000, 4))
            .dispatch(&plan, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcomes[0].result.as_ref().unwrap_err(),
            &SourceFailure::Timeout { after_ms: 100 }
        );
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test]
    async fn panic_is_isolated() {
        let mut plan = plan();
        plan.push("panics", Category::Knowledge, 1.0, Arc::new(Panics));
        plan.push("ok", Category::Knowledge, 1.0, Arc::new(Delayed { delay_ms: 0, url: "https://ok" }));

        let outcomes = FederatedSearch::new(&settings(1_000, 5_000, 4))
            .dispatch(&plan, &CancellationToken::new())
            .await
            .unwrap();

        match &outcomes[0].result {
            Err(SourceFailure::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected panic failure, got {other:?}"),
        }
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn global_deadline_aborts() {
        let mut plan = plan();
        plan.push("slow", Category::General, 1.0, Arc::new(Delayed { delay_ms: 10_000, url: "https://slow" }));

        let err = FederatedSearch::new(&settings(60_000, 200, 4))
            .dispatch(&plan, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::OrchestrationTimeout { after_ms: 200 }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts() {
        let mut plan = plan();
        plan.push("slow", Category::General, 1.0, Arc::new(Delayed { delay_ms: 10_000, url: "https://slow" }));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = FederatedSearch::new(&settings(60_000, 60_000, 4))
            .dispatch(&plan, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_cap_is_respected() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut plan = plan();
        for i in 0..7 {
            plan.push(
                format!("s{i}"),
                Category::Product,
                1.0,
                Arc::new(Counting {
                    running: Arc::clone(&running),
                    peak: Arc::clone(&peak),
                }),
            );
        }

        let outcomes = FederatedSearch::new(&settings(1_000, 10_000, 2))
            .dispatch(&plan, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 7);
        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_sources_get_full_timeout() {
        // Each call takes 80ms with a 100ms budget; with a cap of 1 the last
        // one starts after 160ms of queueing and must still succeed.
        let mut plan = plan();
        for i in 0..3 {
            plan.push(format!("s{i}"), Category::Academic, 1.0, Arc::new(Delayed { delay_ms: 80, url: "https://x" }));
        }

        let outcomes = FederatedSearch::new(&settings(100, 10_000, 1))
            .dispatch(&plan, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcomes.iter().all(|o| o.is_ok()));
    }

    #[test]
    fn duplicate_sources_are_planned_once() {
        let mut plan = plan();
        let adapter: Arc<dyn SourceAdapter> = Arc::new(Panics);
        assert!(plan.push("a", Category::Academic, 1.0, Arc::clone(&adapter)));
        assert!(!plan.push("a", Category::General, 1.0, Arc::clone(&adapter)));
        assert!(plan.push("b", Category::General, 1.0, adapter));
        assert_eq!(plan.len(), 2);
        assert_eq!(planned_names(&plan), vec!["a", "b"]);
    }

    #[test]
    fn qualifier_pass_adds_selected_engine_once() {
        use crate::registry::{builtin_sources, Engine};

        let mut registry = SourceRegistry::new(Engine::Google);
        for descriptor in builtin_sources() {
            registry.register(descriptor.clone(), Arc::new(Panics));
        }

        let mut plan = DispatchPlan::build(plan().query().clone(), &[Category::Academic], &registry);
        let academic = plan.len();
        assert!(plan.add_qualifier_pass(&registry));
        assert_eq!(plan.len(), academic + 1);
        assert_eq!(planned_names(&plan).last(), Some(&"google"));
        assert!(!planned_names(&plan).contains(&"duckduckgo"));

        assert!(!plan.add_qualifier_pass(&registry));
        assert_eq!(plan.len(), academic + 1);
    }

    #[tokio::test]
    async fn empty_plan_is_empty_result() {
        let outcomes = FederatedSearch::new(&SearchSettings::default())
            .dispatch(&plan(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }
}
