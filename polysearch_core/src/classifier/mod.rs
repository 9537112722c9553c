//! Category classification.
//!
//! Every category is scored by one or more [`CategoryRule`]s. The category
//! with the strictly highest total wins; a tie at the top, or no signal at
//! all, falls back to [`Category::General`].

pub mod lexicon;

use crate::category::Category;
use crate::qualifiers::QualifierSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub use lexicon::{LexiconRule, QualifierCue};

/// A scoring strategy for one category.
pub trait CategoryRule: Send + Sync {
    fn category(&self) -> Category;

    /// Non-negative evidence that `text` belongs to [`Self::category`].
    fn score(&self, text: &str, qualifiers: &QualifierSet) -> u32;
}

/// Outcome of automatic classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// Total of the winning category (0 when falling back to general)
    pub score: u32,
    /// Totals for every category that has at least one rule
    pub scores: BTreeMap<Category, u32>,
}

/// The categories a query will be searched under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Non-empty, ordered, no duplicates
    pub categories: Vec<Category>,
    /// `None` when the category was forced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default)]
    pub forced: bool,
}

impl Resolution {
    pub fn primary(&self) -> Category {
        self.categories.first().copied().unwrap_or(Category::General)
    }
}

pub struct Classifier {
    rules: Vec<Box<dyn CategoryRule>>,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Default for Classifier {
    /// Classifier with the built-in lexicon rules.
    fn default() -> Self {
        let mut classifier = Self::empty();
        for rule in lexicon::builtin_rules() {
            classifier.register(rule);
        }
        classifier
    }
}

impl Classifier {
    /// A classifier with no rules; everything resolves to general.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Box<dyn CategoryRule>) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: impl CategoryRule + 'static) -> Self {
        self.register(Box::new(rule));
        self
    }

    /// Score `text` against every rule.
    pub fn classify(&self, text: &str, qualifiers: &QualifierSet) -> Classification {
        let mut scores: BTreeMap<Category, u32> = BTreeMap::new();
        for rule in &self.rules {
            let points = rule.score(text, qualifiers);
            let total = scores.entry(rule.category()).or_insert(0);
            *total = total.saturating_add(points);
        }

        let best = scores.values().copied().max().unwrap_or(0);
        let leaders: Vec<Category> = scores
            .iter()
            .filter(|(_, &score)| score == best)
            .map(|(category, _)| *category)
            .collect();

        let (category, score) = match leaders.as_slice() {
            [only] if best > 0 => (*only, best),
            _ => (Category::General, 0),
        };

        debug!(%category, score, ?scores, "classified query");
        Classification {
            category,
            score,
            scores,
        }
    }

    /// Decide which categories to search.
    ///
    /// A forced category is taken as-is and no rule is evaluated.
    pub fn resolve(
        &self,
        base_query: &str,
        qualifiers: &QualifierSet,
        forced: Option<Category>,
        include_general: bool,
    ) -> Resolution {
        let (primary, classification) = match forced {
            Some(category) => (category, None),
            None => {
                let classification = self.classify(base_query, qualifiers);
                (classification.category, Some(classification))
            }
        };

        let mut categories = vec![primary];
        if include_general && primary != Category::General {
            categories.push(Category::General);
        }

        Resolution {
            categories,
            classification,
            forced: forced.is_some(),
        }
    }
}
