use async_trait::async_trait;
use polysearch_core::error::{SearchError, SourceFailure};
use polysearch_core::federated::{ResultRecord, SearchReport, SearchSettings, SourceQuery};
use polysearch_core::qualifiers::{Qualifier, RawQualifiers};
use polysearch_core::registry::{builtin_sources, Engine, SourceRegistry};
use polysearch_core::{search, CancellationToken, Category, SearchRequest, SourceAdapter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Reply {
    Hits(Vec<&'static str>),
    Fail(SourceFailure),
}

struct MockAdapter {
    name: &'static str,
    delay_ms: u64,
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, _request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        match &self.reply {
            Reply::Hits(urls) => Ok(urls
                .iter()
                .map(|url| ResultRecord::new(self.name, format!("{} result", self.name), *url))
                .collect()),
            Reply::Fail(failure) => Err(failure.clone()),
        }
    }
}

/// Web engine stand-in that remembers the `site` each call carried.
struct SiteRecorder {
    sites: Arc<Mutex<Vec<Option<String>>>>,
}

#[async_trait]
impl SourceAdapter for SiteRecorder {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        let site = request.qualifiers.get(Qualifier::Site).map(str::to_string);
        self.sites.lock().unwrap().push(site);
        Ok(vec![ResultRecord::new("duckduckgo", "repo", "https://github.com/org/transformers")])
    }
}

struct Harness {
    registry: SourceRegistry,
    calls: HashMap<&'static str, Arc<AtomicUsize>>,
}

impl Harness {
    /// Every built-in source, answering per `reply_for` after `delay_for` ms.
    fn new(
        engine: Engine,
        reply_for: impl Fn(&str) -> Reply,
        delay_for: impl Fn(&str) -> u64,
    ) -> Self {
        let mut registry = SourceRegistry::new(engine);
        let mut calls = HashMap::new();
        for descriptor in builtin_sources() {
            let counter = Arc::new(AtomicUsize::new(0));
            calls.insert(descriptor.name, Arc::clone(&counter));
            registry.register(
                descriptor.clone(),
                Arc::new(MockAdapter {
                    name: descriptor.name,
                    delay_ms: delay_for(descriptor.name),
                    reply: reply_for(descriptor.name),
                    calls: counter,
                }),
            );
        }
        Self { registry, calls }
    }

    fn calls(&self, source: &str) -> usize {
        self.calls[source].load(Ordering::SeqCst)
    }

    fn total_calls(&self) -> usize {
        self.calls.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }
}

fn unique_hits(source: &str) -> Reply {
    let urls: Vec<&'static str> = match source {
        "arxiv" => vec!["https://arxiv.org/abs/1", "https://arxiv.org/abs/2"],
        "google_scholar" => vec!["https://scholar.google.com/a"],
        "wikipedia" => vec!["https://en.wikipedia.org/wiki/A"],
        "techradar" => vec!["https://techradar.com/a"],
        "cnet" => vec!["https://cnet.com/a"],
        "reddit" => vec!["https://reddit.com/r/a"],
        "ustr" => vec!["https://ustr.gov/a", "https://ustr.gov/b"],
        "reuters" => vec!["https://reuters.com/a"],
        "duckduckgo" => vec!["https://ddg.example/a"],
        "google" => vec!["https://google.example/a"],
        _ => vec![],
    };
    Reply::Hits(urls)
}

fn no_delay(_: &str) -> u64 {
    0
}

fn request(query: &str, top_n: i64) -> SearchRequest {
    SearchRequest::new(query, top_n)
}

async fn run(harness: &Harness, request: &SearchRequest) -> Result<SearchReport, SearchError> {
    search(
        request,
        &harness.registry,
        &SearchSettings::default(),
        &CancellationToken::new(),
    )
    .await
}

#[tokio::test]
async fn forced_category_only_queries_its_sources() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);
    let mut req = request("research paper on machine learning", 10);
    req.category = Some(Category::Policy);

    let report = run(&harness, &req).await.unwrap();

    assert_eq!(report.resolution.categories, vec![Category::Policy]);
    assert!(report.resolution.classification.is_none());
    assert_eq!(harness.calls("ustr"), 1);
    assert_eq!(harness.calls("reuters"), 1);
    assert_eq!(harness.calls("arxiv"), 0);
    assert_eq!(harness.calls("duckduckgo"), 0);
    assert_eq!(report.results.len(), 3);
}

#[tokio::test]
async fn auto_detected_category_with_general() {
    let harness = Harness::new(Engine::Google, unique_hits, no_delay);
    let mut req = request("latest tariff news", 10);
    req.include_general = true;

    let report = run(&harness, &req).await.unwrap();

    assert_eq!(
        report.resolution.categories,
        vec![Category::Policy, Category::General]
    );
    assert_eq!(harness.calls("google"), 1);
    assert_eq!(harness.calls("duckduckgo"), 0);
    let sources: Vec<_> = report.sources.iter().map(|s| s.source.as_str()).collect();
    assert_eq!(sources, vec!["ustr", "reuters", "google"]);
}

#[tokio::test]
async fn category_results_outrank_general_at_equal_position() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);
    let mut req = request("what is quantum computing", 10);
    req.include_general = true;

    let report = run(&harness, &req).await.unwrap();

    let order: Vec<_> = report.results.results.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(order, vec!["wikipedia", "duckduckgo"]);
}

#[tokio::test]
async fn non_positive_top_n_fails_before_any_adapter_runs() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);
    for top_n in [0, -3] {
        let err = run(&harness, &request("latest tariff news", top_n))
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn inverted_dates_fail_before_any_adapter_runs() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);
    let mut req = request("tariffs", 5);
    req.qualifiers.set(Qualifier::After, "2024-05-01");
    req.qualifiers.set(Qualifier::Before, "2024-01-01");

    let err = run(&harness, &req).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn all_sources_failing_is_an_empty_success() {
    let harness = Harness::new(
        Engine::DuckDuckGo,
        |_| Reply::Fail(SourceFailure::Transport("connection refused".into())),
        no_delay,
    );
    let mut req = request("best gaming laptops", 5);
    req.include_general = true;

    let report = run(&harness, &req).await.unwrap();

    assert!(report.results.is_empty());
    assert!(report.all_sources_failed());
    assert_eq!(report.failures().count(), 4);
}

#[tokio::test]
async fn empty_results_are_not_failures() {
    let harness = Harness::new(Engine::DuckDuckGo, |_| Reply::Hits(vec![]), no_delay);
    let report = run(&harness, &request("history of the internet", 5)).await.unwrap();
    assert!(report.results.is_empty());
    assert!(!report.all_sources_failed());
    assert!(!report.has_errors());
}

#[tokio::test]
async fn scheme_variants_collapse_to_the_trusted_copy() {
    let harness = Harness::new(
        Engine::DuckDuckGo,
        |source| match source {
            "google_scholar" => Reply::Hits(vec!["http://Example.com/a/"]),
            "arxiv" => Reply::Hits(vec!["https://example.com/a"]),
            _ => Reply::Hits(vec![]),
        },
        no_delay,
    );
    let mut req = request("anything", 5);
    req.category = Some(Category::Academic);

    let report = run(&harness, &req).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results.results[0].source, "arxiv");
    assert_eq!(report.results.duplicates, 1);
}

#[tokio::test(start_paused = true)]
async fn completion_order_does_not_change_output() {
    let mut req = request("best laptops", 10);
    req.category = Some(Category::Product);
    req.include_general = true;

    let fast_first = Harness::new(Engine::DuckDuckGo, unique_hits, |source| match source {
        "techradar" => 10,
        "cnet" => 20,
        "reddit" => 30,
        _ => 40,
    });
    let slow_first = Harness::new(Engine::DuckDuckGo, unique_hits, |source| match source {
        "techradar" => 40,
        "cnet" => 30,
        "reddit" => 20,
        _ => 10,
    });

    let a = run(&fast_first, &req).await.unwrap();
    let b = run(&slow_first, &req).await.unwrap();

    assert_eq!(a.results.results, b.results.results);
    assert_eq!(a.results.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_alone() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, |source| match source {
        "reuters" => 60_000,
        _ => 5,
    });
    let mut req = request("trade regulations", 5);
    req.category = Some(Category::Policy);

    let report = run(&harness, &req).await.unwrap();

    let reuters = report.sources.iter().find(|s| s.source == "reuters").unwrap();
    assert!(reuters.failure.as_ref().is_some_and(|f| f.is_timeout()));
    assert_eq!(report.results.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn global_deadline_is_an_error() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, |_| 5_000);
    let settings = SearchSettings {
        per_source_timeout_ms: 10_000,
        global_timeout_ms: 1_000,
        ..SearchSettings::default()
    };
    let mut req = request("q", 5);
    req.category = Some(Category::Academic);

    let err = search(&req, &harness.registry, &settings, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::OrchestrationTimeout { after_ms: 1_000 }));
}

#[tokio::test]
async fn cancelled_search_returns_cancelled() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, |_| 5_000);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = search(
        &request("q", 5),
        &harness.registry,
        &SearchSettings::default(),
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SearchError::Cancelled));
}

#[tokio::test]
async fn top_n_truncates() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);
    let mut req = request("x", 2);
    req.category = Some(Category::Policy);
    let report = run(&harness, &req).await.unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results.results[0].url, "https://ustr.gov/a");
    assert_eq!(report.results.results[1].url, "https://reuters.com/a");
}

#[tokio::test]
async fn explicit_site_flag_overrides_inline() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);
    let mut flags = RawQualifiers::default();
    flags.set(Qualifier::Site, "arxiv.org");
    let req = SearchRequest {
        qualifiers: flags,
        ..request("attention site:example.com", 5)
    };

    let report = run(&harness, &req).await.unwrap();

    assert_eq!(report.base_query, "attention");
    assert_eq!(report.qualifiers.get(Qualifier::Site), Some("arxiv.org"));
    assert_eq!(report.resolution.categories, vec![Category::Academic]);
}

#[tokio::test]
async fn site_qualifier_reaches_the_web_engine() {
    let mut harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);
    let sites = Arc::new(Mutex::new(Vec::new()));
    let descriptor = builtin_sources()
        .iter()
        .find(|d| d.name == "duckduckgo")
        .unwrap()
        .clone();
    harness.registry.register(
        descriptor,
        Arc::new(SiteRecorder {
            sites: Arc::clone(&sites),
        }),
    );

    let mut flags = RawQualifiers::default();
    flags.set(Qualifier::Site, "github.com");
    let req = SearchRequest {
        qualifiers: flags,
        ..request("research paper on transformers", 10)
    };

    let report = run(&harness, &req).await.unwrap();

    assert_eq!(report.resolution.categories, vec![Category::Academic]);
    assert_eq!(*sites.lock().unwrap(), vec![Some("github.com".to_string())]);
    assert!(report.sources.iter().any(|s| s.source == "duckduckgo"));
    assert!(report
        .results
        .results
        .iter()
        .any(|r| r.url == "https://github.com/org/transformers"));
}

#[tokio::test]
async fn plain_query_skips_the_web_engine() {
    let harness = Harness::new(Engine::DuckDuckGo, unique_hits, no_delay);

    run(&harness, &request("research paper on transformers", 10)).await.unwrap();

    assert_eq!(harness.calls("duckduckgo"), 0);
    assert!(harness.calls("arxiv") > 0);
}

#[tokio::test]
async fn qualifier_pass_and_general_share_one_engine_call() {
    let harness = Harness::new(Engine::Google, unique_hits, no_delay);
    let mut req = request("latest tariff news filetype:pdf", 10);
    req.include_general = true;

    run(&harness, &req).await.unwrap();

    assert_eq!(harness.calls("google"), 1);
    assert_eq!(harness.calls("duckduckgo"), 0);
}
