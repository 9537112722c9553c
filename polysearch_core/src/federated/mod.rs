//! Federated search across multiple sources.
//!
//! This module provides:
//! - `ResultRecord`: A normalized search result format
//! - `FederatedSearch`: Engine for parallel multi-source search
//! - `consolidate`: Dedup, filter, score and rank of the joined outcomes
//! - `SearchSettings`: Timeouts, concurrency and weight overrides
//!
//! # Example
//!
//! ```ignore
//! use polysearch_core::federated::{consolidate, DispatchPlan, FederatedSearch, TopN};
//!
//! let plan = DispatchPlan::build(query, &[Category::Academic], &registry);
//! let outcomes = FederatedSearch::new(&settings).dispatch(&plan, &cancel).await?;
//! let ranked = consolidate(&outcomes, &qualifiers, TopN::new(5)?);
//! ```

pub mod consolidate;
mod engine;
mod settings;
mod types;
pub mod url_normalize;

pub use consolidate::{consolidate, TopN};
pub use engine::{planned_names, DispatchPlan, FederatedSearch, PlannedSource};
pub use settings::{SearchSettings, SettingsStore};
pub use types::{
    ConsolidatedList, FederationMeta, ResultRecord, SearchReport, SourceOutcome, SourceQuery,
    SourceReport,
};
