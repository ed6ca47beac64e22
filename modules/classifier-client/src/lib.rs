pub mod error;
mod schema;

pub use error::{ClassifierError, Result};

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Hard cap on items per classifier call. Callers batch above this.
pub const MAX_BATCH_SIZE: usize = 20;

/// One candidate text to classify, with short product context.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyItem {
    pub text: String,
    pub context: String,
}

/// Per-item classifier output. "Real review" means an opinion/experience
/// statement, not a question, navigation fragment, or spec sheet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub is_real_review: bool,
    pub confidence: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BatchVerdicts {
    verdicts: Vec<Verdict>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

const SYSTEM_PROMPT: &str = "You classify candidate texts scraped from the web. \
For each numbered item, decide whether it is a real product review (a personal \
opinion or usage experience) as opposed to a question, navigation fragment, \
marketing copy, or specification sheet. Return one verdict per item, in order, \
with a confidence between 0 and 1.";

pub struct ClassifierClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ClassifierClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.to_string(),
            base_url: OPENAI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Classify a batch of up to [`MAX_BATCH_SIZE`] items. Returns one
    /// verdict per input item, in input order.
    pub async fn classify_batch(&self, items: &[ClassifyItem]) -> Result<Vec<Verdict>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        if items.len() > MAX_BATCH_SIZE {
            return Err(ClassifierError::Malformed(format!(
                "batch of {} exceeds maximum of {MAX_BATCH_SIZE}",
                items.len()
            )));
        }

        let mut user_prompt = String::new();
        for (i, item) in items.iter().enumerate() {
            user_prompt.push_str(&format!(
                "--- Item {} (context: {}) ---\n{}\n\n",
                i + 1,
                item.context,
                item.text
            ));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "batch_verdicts",
                    "strict": true,
                    "schema": schema::openai_schema::<BatchVerdicts>(),
                },
            },
        });

        debug!(model = %self.model, items = items.len(), "Classifier batch request");

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = resp.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifierError::Malformed("empty completion".to_string()))?;

        let batch: BatchVerdicts = serde_json::from_str(&content)
            .map_err(|e| ClassifierError::Malformed(format!("bad verdict JSON: {e}")))?;

        if batch.verdicts.len() != items.len() {
            return Err(ClassifierError::Malformed(format!(
                "expected {} verdicts, got {}",
                items.len(),
                batch.verdicts.len()
            )));
        }

        Ok(batch.verdicts)
    }
}
