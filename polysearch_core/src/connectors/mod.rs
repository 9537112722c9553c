//! Built-in source adapters.
//!
//! Each HTTP connector sits behind a cargo feature. Descriptors whose
//! connector is compiled out are bound to [`UnavailableAdapter`].

#[cfg(feature = "arxiv")]
pub mod arxiv;
#[cfg(feature = "duckduckgo")]
pub mod duckduckgo;
#[cfg(feature = "google")]
pub mod google;
pub mod site_scoped;
#[cfg(feature = "wikipedia")]
pub mod wikipedia;

use crate::error::{SearchError, SourceFailure};
use crate::federated::{ResultRecord, SourceQuery};
use crate::qualifiers::Qualifier;
use crate::registry::{Engine, SourceDescriptor, SourceKind};
use crate::SourceAdapter;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup regex"));

const USER_AGENT: &str = concat!("polysearch/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by every connector.
pub fn http_client() -> Result<Client, SearchError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SearchError::config(format!("failed to build HTTP client: {}", e)))
}

/// Stand-in for a connector that was not compiled in.
#[derive(Debug, Clone)]
pub struct UnavailableAdapter {
    name: String,
}

impl UnavailableAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl SourceAdapter for UnavailableAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        Err(SourceFailure::Unavailable(format!(
            "{} support is not enabled in this build",
            self.name
        )))
    }
}

/// Adapter for a descriptor, given the selected web engine.
pub fn adapter_for(
    descriptor: &SourceDescriptor,
    engine: Engine,
    client: &Client,
) -> Arc<dyn SourceAdapter> {
    match descriptor.kind {
        SourceKind::Arxiv => arxiv_adapter(client),
        SourceKind::Wikipedia => wikipedia_adapter(client),
        SourceKind::WebEngine(own) => engine_adapter(own, client),
        SourceKind::SiteScoped(domain) => Arc::new(site_scoped::SiteScopedAdapter::new(
            descriptor.name,
            domain,
            engine_adapter(engine, client),
        )),
    }
}

#[allow(unused_variables)]
fn arxiv_adapter(client: &Client) -> Arc<dyn SourceAdapter> {
    #[cfg(feature = "arxiv")]
    let adapter: Arc<dyn SourceAdapter> = Arc::new(arxiv::ArxivAdapter::new(client.clone()));
    #[cfg(not(feature = "arxiv"))]
    let adapter: Arc<dyn SourceAdapter> = Arc::new(UnavailableAdapter::new("arxiv"));
    adapter
}

#[allow(unused_variables)]
fn wikipedia_adapter(client: &Client) -> Arc<dyn SourceAdapter> {
    #[cfg(feature = "wikipedia")]
    let adapter: Arc<dyn SourceAdapter> =
        Arc::new(wikipedia::WikipediaAdapter::new(client.clone()));
    #[cfg(not(feature = "wikipedia"))]
    let adapter: Arc<dyn SourceAdapter> = Arc::new(UnavailableAdapter::new("wikipedia"));
    adapter
}

#[allow(unused_variables)]
fn engine_adapter(engine: Engine, client: &Client) -> Arc<dyn SourceAdapter> {
    match engine {
        Engine::DuckDuckGo => {
            #[cfg(feature = "duckduckgo")]
            let adapter: Arc<dyn SourceAdapter> =
                Arc::new(duckduckgo::DuckDuckGoAdapter::new(client.clone()));
            #[cfg(not(feature = "duckduckgo"))]
            let adapter: Arc<dyn SourceAdapter> = Arc::new(UnavailableAdapter::new("duckduckgo"));
            adapter
        }
        Engine::Google => {
            #[cfg(feature = "google")]
            let adapter: Arc<dyn SourceAdapter> =
                Arc::new(google::GoogleAdapter::from_env(client.clone()));
            #[cfg(not(feature = "google"))]
            let adapter: Arc<dyn SourceAdapter> = Arc::new(UnavailableAdapter::new("google"));
            adapter
        }
    }
}

/// Query text with qualifiers written as web search operators
/// (`site:`, `filetype:`, `intitle:`, `before:` ...).
pub fn web_query(request: &SourceQuery) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !request.query.is_empty() {
        parts.push(request.query.clone());
    }
    for (qualifier, value) in request.qualifiers.iter() {
        let value = if value.contains(char::is_whitespace) && !is_word_list(qualifier) {
            format!("\"{}\"", value)
        } else {
            value
        };
        parts.push(format!("{}:{}", qualifier, value));
    }
    parts.join(" ")
}

fn is_word_list(qualifier: Qualifier) -> bool {
    matches!(
        qualifier,
        Qualifier::Allinurl | Qualifier::Allintitle | Qualifier::Allintext
    )
}

/// Strip markup from an HTML snippet and decode entities.
pub(crate) fn plain_text(html: &str) -> String {
    let text = MARKUP.replace_all(html, "");
    let decoded = html_escape::decode_html_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a non-success HTTP status to a transport failure.
pub(crate) fn check_status(source: &str, response: &reqwest::Response) -> Result<(), SourceFailure> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SourceFailure::Transport(format!(
            "{} returned HTTP {}",
            source, status
        )))
    }
}
