//! Merging per-source outcomes into one ranked list.
//!
//! Steps, in order:
//!
//! 1. Flatten successful outcomes in dispatch order, stamping each record
//!    with its source, category, trust weight, within-source rank and a
//!    global arrival index.
//! 2. Deduplicate by [`dedup_key`]; the copy from the most trusted source
//!    survives, earlier arrival breaking ties.
//! 3. Drop records outside the `after`/`before` window. Undated records stay.
//! 4. Score: `weight * signal`, where `signal` is the record's relevance
//!    divided by the best relevance its source reported, or `1 / rank`
//!    when the source gives no usable relevance.
//! 5. Sort by score, then weight, then arrival.
//! 6. Keep the first `top_n`.

use super::types::{ConsolidatedList, ResultRecord, SourceOutcome};
use super::url_normalize::dedup_key;
use crate::error::SearchError;
use crate::qualifiers::QualifierSet;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tracing::debug;

/// Number of results to keep. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopN(NonZeroUsize);

impl TopN {
    pub fn new(n: i64) -> Result<Self, SearchError> {
        usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(TopN)
            .ok_or_else(|| SearchError::config(format!("top-n must be a positive number, got {}", n)))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for TopN {
    fn default() -> Self {
        TopN(NonZeroUsize::MIN.saturating_add(4))
    }
}

/// Run the whole consolidation pipeline.
pub fn consolidate(
    outcomes: &[SourceOutcome],
    qualifiers: &QualifierSet,
    top_n: TopN,
) -> ConsolidatedList {
    let flattened = flatten(outcomes);
    let total = flattened.len();

    let (mut records, duplicates) = deduplicate(flattened);

    let dates = qualifiers.dates();
    let before_filter = records.len();
    if dates.is_active() {
        records.retain(|r| r.published.map_or(true, |d| dates.contains(d)));
    }
    let filtered_out = before_filter - records.len();

    score(&mut records, outcomes);
    let results = rank(records, top_n);

    debug!(
        total,
        duplicates,
        filtered_out,
        kept = results.len(),
        "consolidated results"
    );

    ConsolidatedList {
        results,
        duplicates,
        filtered_out,
    }
}

fn flatten(outcomes: &[SourceOutcome]) -> Vec<ResultRecord> {
    let mut arrival = 0;
    let mut flattened = Vec::new();

    for outcome in outcomes {
        let Ok(records) = &outcome.result else { continue };
        for (index, record) in records.iter().enumerate() {
            let mut record = record.clone();
            record.source = outcome.source.clone();
            record.category = outcome.category;
            record.federation.weight = outcome.weight;
            record.federation.source_rank = index + 1;
            record.federation.arrival = arrival;
            record.federation.score = None;
            arrival += 1;
            flattened.push(record);
        }
    }
    flattened
}

/// Collapse records that point at the same page.
///
/// Returns the survivors in first-seen order and how many were merged away.
pub fn deduplicate(records: Vec<ResultRecord>) -> (Vec<ResultRecord>, usize) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<ResultRecord> = Vec::with_capacity(records.len());
    let mut duplicates = 0;

    for record in records {
        let Some(key) = dedup_key(&record.url) else {
            kept.push(record);
            continue;
        };

        match seen.get(&key) {
            Some(&slot) => {
                duplicates += 1;
                if outranks(&record, &kept[slot]) {
                    kept[slot] = record;
                }
            }
            None => {
                seen.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    (kept, duplicates)
}

/// True if `candidate` should replace `current` as the surviving duplicate.
fn outranks(candidate: &ResultRecord, current: &ResultRecord) -> bool {
    match candidate.federation.weight.total_cmp(&current.federation.weight) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.federation.arrival < current.federation.arrival,
    }
}

/// Relevance is used only for sources that scored every record they
/// returned; any other source is scored by position for all of its records.
fn score(records: &mut [ResultRecord], outcomes: &[SourceOutcome]) {
    let best_relevance: HashMap<&str, f64> = outcomes
        .iter()
        .filter_map(|outcome| {
            let records = outcome.result.as_ref().ok()?;
            let scored: Option<Vec<f64>> = records.iter().map(|r| usable(r.relevance)).collect();
            let best = scored?.into_iter().reduce(f64::max)?;
            Some((outcome.source.as_str(), best))
        })
        .collect();

    for record in records.iter_mut() {
        let signal = match (
            best_relevance.get(record.source.as_str()),
            usable(record.relevance),
        ) {
            (Some(&best), Some(raw)) => raw / best,
            _ => 1.0 / record.federation.source_rank.max(1) as f64,
        };
        record.federation.score = Some(record.federation.weight * signal);
    }
}

fn usable(relevance: Option<f64>) -> Option<f64> {
    relevance.filter(|v| v.is_finite() && *v > 0.0)
}

/// Order by score, trust weight, arrival and keep the first `top_n`.
///
/// Uses the scores already stored on the records.
pub fn rank(mut records: Vec<ResultRecord>, top_n: TopN) -> Vec<ResultRecord> {
    records.sort_by(compare);
    records.truncate(top_n.get());
    records
}

fn compare(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| b.federation.weight.total_cmp(&a.federation.weight))
        .then_with(|| a.federation.arrival.cmp(&b.federation.arrival))
}
