use crate::connectors::check_status;
use crate::error::SourceFailure;
use crate::federated::{ResultRecord, SourceQuery};
use crate::qualifiers::QualifierSet;
use crate::SourceAdapter;
use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use url::Url;

const API_URL: &str = "https://export.arxiv.org/api/query";

/// One `<entry>` of the Atom feed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArxivEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub published: String,
    pub authors: Vec<String>,
}

impl ArxivEntry {
    fn into_record(self) -> ResultRecord {
        let published = self
            .published
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let url = self.id.replacen("http://", "https://", 1);

        let mut record = ResultRecord::new("arxiv", collapse(&self.title), url)
            .with_snippet(collapse(&self.summary));
        if let Some(date) = published {
            record = record.with_published(date);
        }
        record
    }
}

pub struct ArxivAdapter {
    client: Client,
}

impl ArxivAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn search(&self, request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        let mut url = Url::parse(API_URL)
            .map_err(|e| SourceFailure::Transport(format!("Failed to parse URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("search_query", &search_query(&request.query, &request.qualifiers))
            .append_pair("start", "0")
            .append_pair("max_results", &request.limit.to_string())
            .append_pair("sortBy", "relevance")
            .append_pair("sortOrder", "descending");

        let response = self.client.get(url).send().await?;
        check_status("arXiv API", &response)?;

        let content = response.text().await?;
        let entries = parse_feed(&content)?;
        Ok(entries
            .into_iter()
            .take(request.limit)
            .map(ArxivEntry::into_record)
            .collect())
    }
}

/// arXiv search syntax for the query and the qualifiers it understands.
pub fn search_query(query: &str, qualifiers: &QualifierSet) -> String {
    let mut clauses: Vec<String> = query
        .split_whitespace()
        .map(|word| format!("all:{}", word))
        .collect();

    clauses.extend(qualifiers.title_terms().iter().map(|w| format!("ti:{}", w)));
    clauses.extend(qualifiers.text_terms().iter().map(|w| format!("abs:{}", w)));

    let dates = qualifiers.dates();
    if dates.is_active() {
        let from = dates
            .after
            .map(|d| d.format("%Y%m%d0000").to_string())
            .unwrap_or_else(|| "000001010000".to_string());
        let to = dates
            .before
            .and_then(|d| d.pred_opt())
            .map(|d| d.format("%Y%m%d2359").to_string())
            .unwrap_or_else(|| "999912312359".to_string());
        clauses.push(format!("submittedDate:[{} TO {}]", from, to));
    }

    clauses.join(" AND ")
}

/// Parse an arXiv Atom response.
pub fn parse_feed(xml_content: &str) -> Result<Vec<ArxivEntry>, SourceFailure> {
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<ArxivEntry> = None;
    let mut current_tag: Option<String> = None;
    let mut buffer = Vec::new();

    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "entry" => current = Some(ArxivEntry::default()),
                    "id" | "title" | "summary" | "published" | "name" if current.is_some() => {
                        current_tag = Some(tag_name);
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(tag), Some(entry)) = (current_tag.as_deref(), current.as_mut()) {
                    let text = e
                        .unescape()
                        .map_err(|e| SourceFailure::MalformedResponse(e.to_string()))?
                        .to_string();
                    match tag {
                        "id" => entry.id = text,
                        "title" => entry.title.push_str(&text),
                        "summary" => entry.summary.push_str(&text),
                        "published" => entry.published = text,
                        "name" => entry.authors.push(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag_name == "entry" {
                    if let Some(entry) = current.take() {
                        if !entry.id.is_empty() {
                            entries.push(entry);
                        }
                    }
                } else if current_tag.as_deref() == Some(tag_name.as_str()) {
                    current_tag = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceFailure::MalformedResponse(e.to_string())),
            _ => {}
        }
        buffer.clear();
    }

    Ok(entries)
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
