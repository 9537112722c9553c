//! Weighted keyword lexicons.
//!
//! Strong terms are worth 2 points, weak ones 1. Each term counts once no
//! matter how often it appears. Qualifier cues add points when a qualifier
//! value (usually `site`) points at a source typical for the category.

use super::CategoryRule;
use crate::category::Category;
use crate::error::SearchError;
use crate::qualifiers::{Qualifier, QualifierSet};
use once_cell::sync::Lazy;
use regex::Regex;

const STRONG: u32 = 2;
const WEAK: u32 = 1;
const CUE: u32 = 3;

/// Points awarded when a qualifier value matches a pattern.
#[derive(Debug, Clone)]
pub struct QualifierCue {
    qualifier: Qualifier,
    pattern: Regex,
    points: u32,
}

impl QualifierCue {
    pub fn new(qualifier: Qualifier, pattern: &str, points: u32) -> Result<Self, SearchError> {
        Ok(Self {
            qualifier,
            pattern: compile(pattern)?,
            points,
        })
    }

    fn score(&self, qualifiers: &QualifierSet) -> u32 {
        match qualifiers.get(self.qualifier) {
            Some(value) if self.pattern.is_match(value) => self.points,
            _ => 0,
        }
    }
}

/// A [`CategoryRule`] backed by weighted regex terms.
#[derive(Debug, Clone)]
pub struct LexiconRule {
    category: Category,
    terms: Vec<(Regex, u32)>,
    cues: Vec<QualifierCue>,
}

impl LexiconRule {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            terms: Vec::new(),
            cues: Vec::new(),
        }
    }

    /// Add a term. Patterns are matched case-insensitively.
    pub fn term(mut self, pattern: &str, points: u32) -> Result<Self, SearchError> {
        self.terms.push((compile(pattern)?, points));
        Ok(self)
    }

    pub fn cue(mut self, cue: QualifierCue) -> Self {
        self.cues.push(cue);
        self
    }
}

impl CategoryRule for LexiconRule {
    fn category(&self) -> Category {
        self.category
    }

    fn score(&self, text: &str, qualifiers: &QualifierSet) -> u32 {
        let from_text: u32 = self
            .terms
            .iter()
            .filter(|(pattern, _)| pattern.is_match(text))
            .map(|(_, points)| *points)
            .sum();
        let from_cues: u32 = self.cues.iter().map(|cue| cue.score(qualifiers)).sum();
        from_text + from_cues
    }
}

fn compile(pattern: &str) -> Result<Regex, SearchError> {
    Regex::new(&format!("(?i){}", pattern))
        .map_err(|e| SearchError::config(format!("invalid lexicon pattern '{}': {}", pattern, e)))
}

type TermTable = &'static [(&'static str, u32)];
type CueTable = &'static [(Qualifier, &'static str)];

const ACADEMIC_TERMS: TermTable = &[
    (r"\bresearch(es|ers?)?\b", STRONG),
    (r"\bpapers?\b", STRONG),
    (r"\bacademic\b", STRONG),
    (r"\b(study|studies)\b", STRONG),
    (r"\bmodels?\b", STRONG),
    (r"\bneural networks?\b", STRONG),
    (r"\b(journals?|preprints?|thesis|dissertation|peer[- ]reviewed|citations?)\b", STRONG),
    (r"\bet al\.?", STRONG),
    (r"\b\d{4}\.\d{4,5}(v\d+)?\b", STRONG),
    (r"\b(doi|arxiv)\b", STRONG),
    (r"\b(machine learning|deep learning|algorithms?|theorem|experiments?|empirical|survey|dataset)\b", WEAK),
];

const ACADEMIC_CUES: CueTable = &[
    (Qualifier::Site, r"arxiv\.org|scholar\.google|ieee\.org|acm\.org|nature\.com|springer|\.edu$"),
    (Qualifier::Filetype, r"^(pdf|ps|tex)$"),
];

const KNOWLEDGE_TERMS: TermTable = &[
    (r"^\s*(what|who)\s+(is|are|was|were)\b", STRONG),
    (r"\bhistory\b", STRONG),
    (r"\b(definitions?|define|meaning of)\b", STRONG),
    (r"\b(wiki|wikipedia|encyclopedia)\b", STRONG),
    (r"\b(origins? of|how does|explain(ed)?|overview of|biography)\b", WEAK),
];

const KNOWLEDGE_CUES: CueTable = &[(Qualifier::Site, r"wikipedia\.org|britannica\.com")];

const PRODUCT_TERMS: TermTable = &[
    (r"\bbest\b", STRONG),
    (r"\brecommend(s|ed|ations?)?\b", STRONG),
    (r"\breviews?\b", STRONG),
    (r"\bproducts?\b", STRONG),
    (r"\b(laptops?|smartphones?|phones?|headphones?|tablets?|cameras?|monitors?|servers?|routers?|gpus?|tvs?)\b", STRONG),
    (r"\b(top|cheap(est)?|budget|affordable|deals?|buy(ing)?|price[sd]?|hardware|gadgets?)\b", WEAK),
    (r"\b(vs\.?|versus|compare|comparison)\b", WEAK),
    (r"\b(under|below)\s+\$?\d+", WEAK),
];

const PRODUCT_CUES: CueTable = &[(Qualifier::Site, r"techradar\.com|cnet\.com|reddit\.com|amazon\.|rtings\.com")];

const POLICY_TERMS: TermTable = &[
    (r"\bpolic(y|ies)\b", STRONG),
    (r"\btariffs?\b", STRONG),
    (r"\b(regulations?|regulatory|legislation|laws?|sanctions?|embargo(es)?)\b", STRONG),
    (r"\b(trade|treat(y|ies)|exports?|imports?|customs)\b", STRONG),
    (r"\b(government|congress|senate|parliament|ministry|geopolitic(s|al)|elections?)\b", STRONG),
    (r"\b(latest|news|new|recent|changes|updates?|announced?)\b", WEAK),
];

const POLICY_CUES: CueTable = &[(Qualifier::Site, r"\.gov$|\.gov\.|ustr\.gov|reuters\.com|europa\.eu|wto\.org")];

static BUILTIN: Lazy<Vec<LexiconRule>> = Lazy::new(|| {
    [
        (Category::Academic, ACADEMIC_TERMS, ACADEMIC_CUES),
        (Category::Knowledge, KNOWLEDGE_TERMS, KNOWLEDGE_CUES),
        (Category::Product, PRODUCT_TERMS, PRODUCT_CUES),
        (Category::Policy, POLICY_TERMS, POLICY_CUES),
    ]
    .into_iter()
    .map(|(category, terms, cues)| {
        build(category, terms, cues).expect("built-in lexicon patterns are valid")
    })
    .collect()
});

fn build(category: Category, terms: TermTable, cues: CueTable) -> Result<LexiconRule, SearchError> {
    let mut rule = LexiconRule::new(category);
    for (pattern, points) in terms {
        rule = rule.term(pattern, *points)?;
    }
    for (qualifier, pattern) in cues {
        rule = rule.cue(QualifierCue::new(*qualifier, pattern, CUE)?);
    }
    Ok(rule)
}

/// The default rule set, one lexicon per non-general category.
pub fn builtin_rules() -> Vec<Box<dyn CategoryRule>> {
    BUILTIN
        .iter()
        .cloned()
        .map(|rule| Box::new(rule) as Box<dyn CategoryRule>)
        .collect()
}
