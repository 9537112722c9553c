//! Sources reached by restricting a web engine to one domain.

use crate::error::SourceFailure;
use crate::federated::{ResultRecord, SourceQuery};
use crate::SourceAdapter;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs the wrapped engine with `site:<domain>`, replacing any user `site`.
pub struct SiteScopedAdapter {
    name: String,
    domain: String,
    engine: Arc<dyn SourceAdapter>,
}

impl SiteScopedAdapter {
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        engine: Arc<dyn SourceAdapter>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            engine,
        }
    }
}

#[async_trait]
impl SourceAdapter for SiteScopedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SourceQuery) -> Result<Vec<ResultRecord>, SourceFailure> {
        let scoped = SourceQuery {
            query: request.query.clone(),
            qualifiers: request.qualifiers.with_site(&self.domain),
            limit: request.limit,
        };
        let records = self.engine.search(&scoped).await?;
        Ok(records
            .into_iter()
            .map(|mut record| {
                record.source = self.name.clone();
                record
            })
            .collect())
    }
}
