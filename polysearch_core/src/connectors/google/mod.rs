//! Google Programmable Search (Custom Search JSON API).
//!
//! Needs `GOOGLE_API_KEY` and `GOOGLE_CSE_ID`; without them every search
//! fails as not configured.

use crate::connectors::{check_status, web_query};
use crate::error::SourceFailure;
use crate::federated::{ResultRecord, SourceQuery};
use crate::SourceAdapter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const API_URL: &str = "https://www.googleapis.com/customsearch/v1";
/// The API refuses `num` above 10.
const MAX_PER_REQUEST: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Clone)]
struct Credentials {
    api_key: String,
    engine_id: String,
}

pub struct GoogleAdapter {
    client: Client,
    credentials: Option<Credentials>,
}

impl GoogleAdapter {
    pub fn new(client: Client, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client,
            credentials: Some(Credentials {
                api_key: api_key.into(),
                engine_id: engine_id.into(),
            }),
        }
    }

    /// Read credentials from `GOOGLE_API_KEY` / `GOOGLE_CSE_ID`.
    pub fn from_env(client: Client) -> Self {
        let key = std::env::var("GOOGLE_API_KEY").ok().filter(|v| !v.trim().is_empty());
        let cx = std::env::var("GOOGLE_CSE_ID").ok().filter(|v| !v.trim().is_empty());
        let credentials = match (key, cx) {
            (Some(api_key), Some(engine_id)) => Some(Credentials { api_key, engine_id }),
            _ => None,
        };
        Self {
            client,
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl SourceAdapter for GoogleAdapter {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            SourceFailure::NotConfigured("set GOOGLE_API_KEY and GOOGLE_CSE_ID".to_string())
        })?;

        let q = web_query(request);
        let num = request.limit.min(MAX_PER_REQUEST).to_string();
        let params = [
            ("key", credentials.api_key.as_str()),
            ("cx", credentials.engine_id.as_str()),
            ("q", q.as_str()),
            ("num", num.as_str()),
        ];

        let response = self.client.get(API_URL).query(&params).send().await?;
        check_status("Google Custom Search", &response)?;

        let body = response.text().await?;
        parse_items(&body)
    }
}

fn parse_items(body: &str) -> Result<Vec<ResultRecord>, SourceFailure> {
    let data: SearchResponse =
        serde_json::from_str(body).map_err(|e| SourceFailure::MalformedResponse(e.to_string()))?;
    Ok(data
        .items
        .into_iter()
        .map(|item| ResultRecord::new("google", item.title, item.link).with_snippet(item.snippet))
        .collect())
}
