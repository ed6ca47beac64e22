pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

/// How long a render may wait for review-shaped DOM elements, and how long
/// to settle afterwards for late-arriving content.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub wait_selectors: Vec<String>,
    pub timeout: Duration,
    pub settle_wait: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wait_selectors: Vec::new(),
            timeout: Duration::from_secs(30),
            settle_wait: Duration::from_secs(5),
        }
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            // Outer bound covers goto + selector wait + settle
            .timeout(Duration::from_secs(45))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    /// Fetch fully-rendered HTML for a URL via the Browserless /content
    /// endpoint, waiting for the first matching selector (or the settle
    /// delay when no selector is given) before snapshotting the DOM.
    pub async fn content(&self, url: &str, options: &RenderOptions) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let mut body = serde_json::json!({
            "url": url,
            "gotoOptions": {
                "timeout": options.timeout.as_millis() as u64,
                "waitUntil": "networkidle2",
            },
        });

        if let Some(selector) = options.wait_selectors.first() {
            body["waitForSelector"] = serde_json::json!({
                "selector": selector,
                "timeout": options.timeout.as_millis() as u64,
            });
        } else {
            body["waitForTimeout"] = serde_json::json!(options.settle_wait.as_millis() as u64);
        }

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
