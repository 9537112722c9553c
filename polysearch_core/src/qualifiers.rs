//! Search qualifier extraction.
//!
//! Qualifiers are the `site:` / `filetype:` / `intitle:` style constraints
//! layered on top of the free-text query. They arrive either as explicit CLI
//! flags or inline in the query text; both are folded into one
//! [`QualifierSet`], with explicit flags winning on conflict.
//!
//! # Example
//!
//! ```
//! use polysearch_core::qualifiers::{parse_query, Qualifier, RawQualifiers};
//!
//! let mut flags = RawQualifiers::default();
//! flags.set(Qualifier::Site, "arxiv.org");
//! let parsed = parse_query("transformers site:example.com filetype:pdf", &flags).unwrap();
//! assert_eq!(parsed.base_query, "transformers");
//! assert_eq!(parsed.qualifiers.get(Qualifier::Site), Some("arxiv.org"));
//! assert_eq!(parsed.qualifiers.get(Qualifier::Filetype), Some("pdf"));
//! ```

use crate::error::SearchError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inline `name:value` or `name:"quoted value"` tokens.
static INLINE_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:^|\s)(site|filetype|inurl|intitle|intext|allinurl|allintitle|allintext|before|after):(?:"([^"]*)"|(\S+))"#,
    )
    .expect("valid inline qualifier regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    Site,
    Filetype,
    Inurl,
    Intitle,
    Intext,
    Allinurl,
    Allintitle,
    Allintext,
    Before,
    After,
}

impl Qualifier {
    pub const ALL: [Qualifier; 10] = [
        Qualifier::Site,
        Qualifier::Filetype,
        Qualifier::Inurl,
        Qualifier::Intitle,
        Qualifier::Intext,
        Qualifier::Allinurl,
        Qualifier::Allintitle,
        Qualifier::Allintext,
        Qualifier::Before,
        Qualifier::After,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Qualifier::Site => "site",
            Qualifier::Filetype => "filetype",
            Qualifier::Inurl => "inurl",
            Qualifier::Intitle => "intitle",
            Qualifier::Intext => "intext",
            Qualifier::Allinurl => "allinurl",
            Qualifier::Allintitle => "allintitle",
            Qualifier::Allintext => "allintext",
            Qualifier::Before => "before",
            Qualifier::After => "after",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Qualifier::ALL.into_iter().find(|q| q.as_str() == name)
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Qualifier::Before | Qualifier::After)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated qualifier values, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQualifiers {
    values: BTreeMap<Qualifier, String>,
}

impl RawQualifiers {
    /// Set a value; blank values are ignored.
    pub fn set(&mut self, qualifier: Qualifier, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() {
            self.values.insert(qualifier, value.to_string());
        }
    }

    /// Set a value only if present.
    pub fn set_opt(&mut self, qualifier: Qualifier, value: Option<&str>) {
        if let Some(v) = value {
            self.set(qualifier, v);
        }
    }

    pub fn get(&self, qualifier: Qualifier) -> Option<&str> {
        self.values.get(&qualifier).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Publication date window. `after` is inclusive, `before` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_active(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.after.map_or(true, |after| date >= after)
            && self.before.map_or(true, |before| date < before)
    }
}

/// Validated qualifiers for one invocation. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierSet {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    terms: BTreeMap<Qualifier, String>,
    #[serde(default)]
    dates: DateRange,
}

impl QualifierSet {
    /// Text value of a non-date qualifier.
    pub fn get(&self, qualifier: Qualifier) -> Option<&str> {
        self.terms.get(&qualifier).map(String::as_str)
    }

    pub fn dates(&self) -> DateRange {
        self.dates
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && !self.dates.is_active()
    }

    /// All qualifiers as `(name, value)` pairs, dates rendered as `YYYY-MM-DD`.
    pub fn iter(&self) -> impl Iterator<Item = (Qualifier, String)> + '_ {
        let dates = [
            (Qualifier::Before, self.dates.before),
            (Qualifier::After, self.dates.after),
        ]
        .into_iter()
        .filter_map(|(q, d)| d.map(|d| (q, d.format(DATE_FORMAT).to_string())));

        self.terms
            .iter()
            .map(|(q, v)| (*q, v.clone()))
            .chain(dates)
    }

    /// Words the title must contain (`intitle` plus each `allintitle` word).
    pub fn title_terms(&self) -> Vec<&str> {
        self.expand(Qualifier::Intitle, Qualifier::Allintitle)
    }

    /// Words the body must contain (`intext` plus each `allintext` word).
    pub fn text_terms(&self) -> Vec<&str> {
        self.expand(Qualifier::Intext, Qualifier::Allintext)
    }

    /// Copy of this set restricted to `domain`, replacing any user `site`.
    pub fn with_site(&self, domain: &str) -> Self {
        let mut scoped = self.clone();
        scoped.terms.insert(Qualifier::Site, domain.to_string());
        scoped
    }

    fn expand(&self, single: Qualifier, all: Qualifier) -> Vec<&str> {
        let mut words: Vec<&str> = self.get(single).into_iter().collect();
        if let Some(list) = self.get(all) {
            words.extend(list.split_whitespace());
        }
        words
    }
}

/// Result of [`parse_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Free text with every qualifier token removed.
    pub base_query: String,
    pub qualifiers: QualifierSet,
}

/// Split `raw` into a base query and a validated [`QualifierSet`].
///
/// Explicit values in `explicit` override inline tokens of the same name.
/// Fails with [`SearchError::Configuration`] on malformed dates, an empty or
/// inverted date range, or a query with neither text nor qualifiers.
pub fn parse_query(raw: &str, explicit: &RawQualifiers) -> Result<ParsedQuery, SearchError> {
    let (base_query, inline) = extract_inline(raw);

    let mut merged = inline;
    for (qualifier, value) in &explicit.values {
        if let Some(previous) = merged.insert(*qualifier, value.clone()) {
            if &previous != value {
                debug!(%qualifier, "explicit qualifier overrides inline value");
            }
        }
    }

    let qualifiers = validate(merged)?;

    if base_query.is_empty() && qualifiers.is_empty() {
        return Err(SearchError::config("query must not be empty"));
    }

    Ok(ParsedQuery {
        base_query,
        qualifiers,
    })
}

fn extract_inline(raw: &str) -> (String, BTreeMap<Qualifier, String>) {
    let mut found: BTreeMap<Qualifier, String> = BTreeMap::new();
    let mut remainder = String::with_capacity(raw.len());
    let mut last = 0;

    for caps in INLINE_QUALIFIER.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        remainder.push_str(&raw[last..whole.start()]);
        remainder.push(' ');
        last = whole.end();

        let Some(qualifier) = caps.get(1).and_then(|m| Qualifier::from_name(m.as_str())) else {
            continue;
        };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if value.is_empty() {
            continue;
        }
        if found.contains_key(&qualifier) {
            debug!(%qualifier, "ignoring repeated inline qualifier");
            continue;
        }
        found.insert(qualifier, value.to_string());
    }
    remainder.push_str(&raw[last..]);

    let base = remainder.split_whitespace().collect::<Vec<_>>().join(" ");
    (base, found)
}

fn validate(values: BTreeMap<Qualifier, String>) -> Result<QualifierSet, SearchError> {
    let mut set = QualifierSet::default();

    for (qualifier, value) in values {
        match qualifier {
            Qualifier::Before => set.dates.before = Some(parse_date(qualifier, &value)?),
            Qualifier::After => set.dates.after = Some(parse_date(qualifier, &value)?),
            _ => {
                set.terms.insert(qualifier, value);
            }
        }
    }

    if let (Some(before), Some(after)) = (set.dates.before, set.dates.after) {
        if before <= after {
            return Err(SearchError::config(format!(
                "empty date range: before ({}) must be later than after ({})",
                before.format(DATE_FORMAT),
                after.format(DATE_FORMAT)
            )));
        }
    }

    Ok(set)
}

fn parse_date(qualifier: Qualifier, value: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        SearchError::config(format!(
            "invalid {} date '{}': expected YYYY-MM-DD",
            qualifier, value
        ))
    })
}
