//! Knowledge categories a query can be routed to.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Papers and preprints
    Academic,
    /// Encyclopedic and reference material
    Knowledge,
    /// Reviews, comparisons and buying advice
    Product,
    /// Regulation, trade and policy news
    Policy,
    /// Plain web search
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Academic,
        Category::Knowledge,
        Category::Product,
        Category::Policy,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Academic => "academic",
            Category::Knowledge => "knowledge",
            Category::Product => "product",
            Category::Policy => "policy",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                SearchError::config(format!(
                    "unknown category '{}' (expected one of: academic, knowledge, product, policy, general)",
                    s.trim()
                ))
            })
    }
}
