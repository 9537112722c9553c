use crate::connectors::{check_status, plain_text};
use crate::error::SourceFailure;
use crate::federated::{ResultRecord, SourceQuery};
use crate::qualifiers::QualifierSet;
use crate::SourceAdapter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchBody>,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

pub struct WikipediaAdapter {
    client: Client,
    language: String,
}

impl WikipediaAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    // Helper method to get the base API URL
    fn base_url(&self) -> String {
        format!("https://{}.wikipedia.org/w/api.php", self.language)
    }

    fn article_url(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.language,
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }

    fn to_records(&self, body: &str) -> Result<Vec<ResultRecord>, SourceFailure> {
        let data: SearchResponse = serde_json::from_str(body)
            .map_err(|e| SourceFailure::MalformedResponse(e.to_string()))?;
        let hits = data
            .query
            .ok_or_else(|| SourceFailure::MalformedResponse("missing 'query' object".to_string()))?
            .search;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let url = self.article_url(&hit.title);
                ResultRecord::new("wikipedia", hit.title, url).with_snippet(plain_text(&hit.snippet))
            })
            .collect())
    }
}

/// CirrusSearch query text: base query plus the qualifiers it supports.
pub fn search_text(query: &str, qualifiers: &QualifierSet) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !query.is_empty() {
        parts.push(query.to_string());
    }
    parts.extend(qualifiers.title_terms().iter().map(|w| format!("intitle:{}", w)));
    parts.extend(qualifiers.text_terms().iter().map(|w| format!("insource:{}", w)));
    parts.join(" ")
}

#[async_trait]
impl SourceAdapter for WikipediaAdapter {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        let limit = request.limit.to_string();
        let text = search_text(&request.query, &request.qualifiers);
        let params = [
            ("action", "query"),
            ("list", "search"),
            ("srprop", "snippet"),
            ("srlimit", limit.as_str()),
            ("srsearch", text.as_str()),
            ("format", "json"),
        ];

        let response = self.client.get(self.base_url()).query(&params).send().await?;
        check_status("Wikipedia API", &response)?;

        let body = response.text().await?;
        self.to_records(&body)
    }
}
