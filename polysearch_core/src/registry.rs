//! Source registry: which sources serve which category.
//!
//! The built-in table is fixed at compile time. A [`SourceRegistry`] binds
//! each descriptor to an adapter once at startup and is read-only after.

use crate::category::Category;
use crate::error::SearchError;
use crate::SourceAdapter;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// General-purpose web engine used for `general` and site-scoped sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    DuckDuckGo,
    Google,
}

impl Engine {
    pub const ALL: [Engine; 2] = [Engine::DuckDuckGo, Engine::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::DuckDuckGo => "duckduckgo",
            Engine::Google => "google",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Engine::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| {
                SearchError::config(format!(
                    "unknown engine '{}' (expected duckduckgo or google)",
                    s.trim()
                ))
            })
    }
}

/// How a descriptor is turned into an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum SourceKind {
    Arxiv,
    Wikipedia,
    WebEngine(Engine),
    /// The selected web engine restricted to one domain
    SiteScoped(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: Category,
    /// Trust weight; higher ranks first and wins duplicates
    pub weight: f64,
    pub kind: SourceKind,
}

impl SourceDescriptor {
    const fn new(
        name: &'static str,
        display_name: &'static str,
        category: Category,
        weight: f64,
        kind: SourceKind,
    ) -> Self {
        Self {
            name,
            display_name,
            category,
            weight,
            kind,
        }
    }
}

static BUILTIN_SOURCES: Lazy<Vec<SourceDescriptor>> = Lazy::new(|| {
    use Category::*;
    use SourceKind::*;
    vec![
        SourceDescriptor::new("arxiv", "arXiv", Academic, 1.5, Arxiv),
        SourceDescriptor::new("google_scholar", "Google Scholar", Academic, 1.3, SiteScoped("scholar.google.com")),
        SourceDescriptor::new("wikipedia", "Wikipedia", Knowledge, 1.4, Wikipedia),
        SourceDescriptor::new("techradar", "TechRadar", Product, 1.2, SiteScoped("techradar.com")),
        SourceDescriptor::new("cnet", "CNET", Product, 1.1, SiteScoped("cnet.com")),
        SourceDescriptor::new("reddit", "Reddit", Product, 1.0, SiteScoped("reddit.com")),
        SourceDescriptor::new("ustr", "USTR", Policy, 1.5, SiteScoped("ustr.gov")),
        SourceDescriptor::new("reuters", "Reuters", Policy, 1.3, SiteScoped("reuters.com")),
        SourceDescriptor::new("duckduckgo", "DuckDuckGo", General, 0.8, WebEngine(Engine::DuckDuckGo)),
        SourceDescriptor::new("google", "Google", General, 0.9, WebEngine(Engine::Google)),
    ]
});

/// The built-in descriptor table, ordered within each category.
pub fn builtin_sources() -> &'static [SourceDescriptor] {
    &BUILTIN_SOURCES
}

/// A descriptor bound to its adapter.
#[derive(Clone)]
pub struct BoundSource {
    pub descriptor: SourceDescriptor,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl fmt::Debug for BoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSource")
            .field("descriptor", &self.descriptor)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    engine: Engine,
    sources: Vec<BoundSource>,
}

impl SourceRegistry {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            sources: Vec::new(),
        }
    }

    /// Bind a descriptor. A later registration with the same name replaces the earlier one.
    pub fn register(&mut self, descriptor: SourceDescriptor, adapter: Arc<dyn SourceAdapter>) {
        let bound = BoundSource {
            descriptor,
            adapter,
        };
        match self
            .sources
            .iter_mut()
            .find(|s| s.descriptor.name == bound.descriptor.name)
        {
            Some(existing) => *existing = bound,
            None => self.sources.push(bound),
        }
    }

    /// Override trust weights by source name.
    pub fn apply_weights(&mut self, weights: &BTreeMap<String, f64>) {
        for (name, weight) in weights {
            match self.sources.iter_mut().find(|s| s.descriptor.name == name.as_str()) {
                Some(source) => source.descriptor.weight = *weight,
                None => warn!(source = %name, "weight override for unknown source ignored"),
            }
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Sources serving `category`, in table order.
    ///
    /// For `general` only the selected engine is returned.
    pub fn sources_for(&self, category: Category) -> Vec<&BoundSource> {
        self.sources
            .iter()
            .filter(|s| s.descriptor.category == category)
            .filter(|s| match s.descriptor.kind {
                SourceKind::WebEngine(engine) => engine == self.engine,
                _ => true,
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&BoundSource> {
        self.sources.iter().find(|s| s.descriptor.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
