//! URL discovery seam. Finding candidate thread/page URLs for a product is
//! an external concern (a search-provider client in the surrounding
//! application); the pipeline only consumes the result.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use reviewharvest_common::{ProductRef, SourceKind};

#[async_trait]
pub trait UrlDiscovery: Send + Sync {
    /// Candidate source URLs for a product on one source kind.
    async fn discover(&self, product: &ProductRef, kind: SourceKind) -> Result<Vec<String>>;
}

/// No-op discovery for deployments without a search provider configured.
pub struct NoopDiscovery;

#[async_trait]
impl UrlDiscovery for NoopDiscovery {
    async fn discover(&self, _product: &ProductRef, _kind: SourceKind) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Fixed URL table, used by tests and one-off CLI runs.
#[derive(Default)]
pub struct StaticDiscovery {
    urls: HashMap<SourceKind, Vec<String>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: SourceKind, urls: &[&str]) -> Self {
        self.urls
            .entry(kind)
            .or_default()
            .extend(urls.iter().map(|u| u.to_string()));
        self
    }
}

#[async_trait]
impl UrlDiscovery for StaticDiscovery {
    async fn discover(&self, _product: &ProductRef, kind: SourceKind) -> Result<Vec<String>> {
        Ok(self.urls.get(&kind).cloned().unwrap_or_default())
    }
}
