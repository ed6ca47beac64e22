use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use reviewharvest_common::FetchResult;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// Seam over plain-HTTP page retrieval. Failures are folded into the
/// returned [`FetchResult`] rather than propagated; an empty body with a
/// recorded error reads as "needs rendering" downstream.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// reqwest-backed fetcher with a bounded timeout.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
        }

        let resp = self.client.get(url).send().await.context("Request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {status}");
        }

        resp.text().await.context("Failed to read response body")
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        match self.get(url).await {
            Ok(html) => {
                info!(url, bytes = html.len(), "Fetched page");
                FetchResult {
                    url: url.to_string(),
                    html,
                    render_used: false,
                    fetch_error: None,
                }
            }
            Err(e) => {
                warn!(url, error = %e, "Fetch failed");
                FetchResult::failed(url, e)
            }
        }
    }
}
