//! DuckDuckGo Instant Answer API.
//!
//! The API returns an abstract plus related topics rather than a ranked
//! web result list, so results are taken in that order.

use crate::connectors::{check_status, plain_text, web_query};
use crate::error::SourceFailure;
use crate::federated::{ResultRecord, SourceQuery};
use crate::SourceAdapter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const API_URL: &str = "https://api.duckduckgo.com/";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    results: Vec<Topic>,
    related_topics: Vec<Topic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Topic {
    #[serde(rename = "FirstURL")]
    first_url: String,
    text: String,
    /// Present on topic groups, which nest further topics
    topics: Vec<Topic>,
}

pub struct DuckDuckGoAdapter {
    client: Client,
}

impl DuckDuckGoAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for DuckDuckGoAdapter {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        let q = web_query(request);
        let params = [
            ("q", q.as_str()),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ];

        let response = self.client.get(API_URL).query(&params).send().await?;
        check_status("DuckDuckGo", &response)?;

        let body = response.text().await?;
        parse_answer(&body, request.limit)
    }
}

fn parse_answer(body: &str, limit: usize) -> Result<Vec<ResultRecord>, SourceFailure> {
    let answer: InstantAnswer =
        serde_json::from_str(body).map_err(|e| SourceFailure::MalformedResponse(e.to_string()))?;

    let mut records = Vec::new();
    if !answer.abstract_url.is_empty() {
        let title = if answer.heading.is_empty() {
            answer.abstract_url.clone()
        } else {
            answer.heading.clone()
        };
        records.push(
            ResultRecord::new("duckduckgo", title, answer.abstract_url.clone())
                .with_snippet(plain_text(&answer.abstract_text)),
        );
    }

    let mut topics = Vec::new();
    flatten_topics(&answer.results, &mut topics);
    flatten_topics(&answer.related_topics, &mut topics);

    for topic in topics {
        if records.len() >= limit {
            break;
        }
        let text = plain_text(&topic.text);
        let title = text
            .split(" - ")
            .next()
            .filter(|t| !t.is_empty())
            .unwrap_or(topic.first_url.as_str())
            .to_string();
        records.push(ResultRecord::new("duckduckgo", title, topic.first_url.clone()).with_snippet(text));
    }

    records.truncate(limit);
    Ok(records)
}

fn flatten_topics<'a>(topics: &'a [Topic], out: &mut Vec<&'a Topic>) {
    for topic in topics {
        if topic.first_url.is_empty() {
            flatten_topics(&topic.topics, out);
        } else {
            out.push(topic);
        }
    }
}
