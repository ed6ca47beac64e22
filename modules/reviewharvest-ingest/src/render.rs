//! Headless rendering behind one contract. Engine choice is a
//! capability-checked selection made once at startup, not a runtime
//! try/catch chain: Browserless when configured, local Chrome when the
//! binary answers, otherwise a no-op that reports failure.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Semaphore;
use tracing::{info, warn};

pub use browserless_client::RenderOptions;

/// Max concurrent Chromium processes. Each instance is heavy (~100MB+ RSS,
/// multiple child processes).
const MAX_CONCURRENT_CHROME: usize = 2;
/// Max retry attempts for transient Chrome failures (e.g. "Cannot fork").
const CHROME_MAX_ATTEMPTS: u32 = 3;
/// Base backoff for Chrome retries. Actual delay is base * 3^attempt + jitter.
const CHROME_RETRY_BASE: Duration = Duration::from_secs(3);

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load a URL in a scriptable browser, wait for review-shaped DOM
    /// elements or the timeout, and return the rendered HTML.
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String>;
    fn name(&self) -> &str;
}

/// Probe available engines once and bind the chosen one.
pub fn select_renderer(
    browserless_url: Option<&str>,
    browserless_token: Option<&str>,
) -> std::sync::Arc<dyn PageRenderer> {
    if let Some(base_url) = browserless_url {
        return std::sync::Arc::new(BrowserlessRenderer::new(base_url, browserless_token));
    }
    if chrome_available() {
        return std::sync::Arc::new(ChromeRenderer::new());
    }
    warn!("No headless engine available; render escalations will fail");
    std::sync::Arc::new(NoopRenderer)
}

fn chrome_available() -> bool {
    let chrome_bin = std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string());
    std::process::Command::new(&chrome_bin)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// --- Chrome renderer ---

pub struct ChromeRenderer {
    semaphore: Semaphore,
}

impl ChromeRenderer {
    pub fn new() -> Self {
        info!("Using ChromeRenderer (dump-dom, max_concurrent={MAX_CONCURRENT_CHROME})");
        Self {
            semaphore: Semaphore::new(MAX_CONCURRENT_CHROME),
        }
    }

    /// Launch Chrome --dump-dom and return raw stdout bytes.
    /// Retries transient fork/launch failures with exponential backoff.
    async fn run_chrome(&self, url: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
        }

        let chrome_bin = std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string());
        // dump-dom has no selector wait; the virtual time budget stands in
        // for the settle delay.
        let settle_ms = options.settle_wait.as_millis() as u64;

        for attempt in 0..CHROME_MAX_ATTEMPTS {
            let tmp_dir = tempfile::tempdir().context("Failed to create temp profile dir")?;

            let result = tokio::time::timeout(
                options.timeout,
                tokio::process::Command::new(&chrome_bin)
                    .args([
                        "--headless",
                        "--no-sandbox",
                        "--disable-gpu",
                        "--disable-dev-shm-usage",
                        &format!("--user-data-dir={}", tmp_dir.path().display()),
                        &format!("--virtual-time-budget={settle_ms}"),
                        "--dump-dom",
                        url,
                    ])
                    .output(),
            )
            .await;

            match result {
                Ok(Ok(output)) => {
                    if output.status.success() {
                        if output.stdout.is_empty() && attempt + 1 < CHROME_MAX_ATTEMPTS {
                            warn!(url, attempt = attempt + 1, "Chrome returned empty DOM, retrying");
                            backoff_sleep(attempt).await;
                            continue;
                        }
                        return Ok(output.stdout);
                    }
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if is_transient_error(&stderr) && attempt + 1 < CHROME_MAX_ATTEMPTS {
                        warn!(url, attempt = attempt + 1, "Chrome cannot fork, retrying");
                        backoff_sleep(attempt).await;
                        continue;
                    }
                    warn!(url, renderer = "chrome", stderr = %stderr, "Chrome exited with error");
                    return Ok(Vec::new());
                }
                Ok(Err(e)) => {
                    let msg = e.to_string();
                    if is_transient_error(&msg) && attempt + 1 < CHROME_MAX_ATTEMPTS {
                        warn!(url, attempt = attempt + 1, error = %e, "Chrome launch failed, retrying");
                        backoff_sleep(attempt).await;
                        continue;
                    }
                    anyhow::bail!("Failed to run Chrome for {url}: {e}");
                }
                Err(_) => {
                    if attempt + 1 < CHROME_MAX_ATTEMPTS {
                        warn!(url, attempt = attempt + 1, "Chrome timed out, retrying");
                        backoff_sleep(attempt).await;
                        continue;
                    }
                    anyhow::bail!("Chrome timed out for {url}");
                }
            }
        }

        Ok(Vec::new())
    }
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| anyhow::anyhow!("Chrome semaphore closed"))?;

        info!(url, renderer = "chrome", "Rendering URL");

        let html = self.run_chrome(url, options).await?;

        if html.is_empty() {
            warn!(url, renderer = "chrome", "Empty DOM output");
            return Ok(String::new());
        }

        let text = String::from_utf8_lossy(&html).into_owned();
        info!(url, renderer = "chrome", bytes = text.len(), "Rendered successfully");
        Ok(text)
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

fn is_transient_error(msg: &str) -> bool {
    msg.contains("Cannot fork") || msg.contains("Resource temporarily unavailable")
}

async fn backoff_sleep(attempt: u32) {
    let backoff = CHROME_RETRY_BASE * 3u32.pow(attempt);
    let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
    tokio::time::sleep(backoff + jitter).await;
}

// --- Browserless renderer ---

pub struct BrowserlessRenderer {
    client: browserless_client::BrowserlessClient,
}

impl BrowserlessRenderer {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        info!(base_url, "Using BrowserlessRenderer");
        Self {
            client: browserless_client::BrowserlessClient::new(base_url, token),
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String> {
        info!(url, renderer = "browserless", "Rendering URL");

        let html = self
            .client
            .content(url, options)
            .await
            .context("Browserless content request failed")?;

        if html.is_empty() {
            warn!(url, renderer = "browserless", "Empty HTML response");
        } else {
            info!(url, renderer = "browserless", bytes = html.len(), "Rendered successfully");
        }
        Ok(html)
    }

    fn name(&self) -> &str {
        "browserless"
    }
}

// --- No-op renderer (no engine available) ---

pub struct NoopRenderer;

#[async_trait]
impl PageRenderer for NoopRenderer {
    async fn render(&self, url: &str, _options: &RenderOptions) -> Result<String> {
        anyhow::bail!("No headless engine available to render {url}")
    }

    fn name(&self) -> &str {
        "noop"
    }
}
