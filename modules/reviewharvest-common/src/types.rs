use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Where a piece of review text came from. Each kind has its own
/// extraction specialization but shares the same candidate contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Store,
    Reddit,
    Forum,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Store => "store",
            SourceKind::Reddit => "reddit",
            SourceKind::Forum => "forum",
        }
    }

    /// Parse a source kind from its wire name. Unknown names return None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "store" => Some(SourceKind::Store),
            "reddit" => Some(SourceKind::Reddit),
            "forum" => Some(SourceKind::Forum),
            _ => None,
        }
    }

    /// Placeholder author shown when a source doesn't expose one.
    pub fn default_author(&self) -> &'static str {
        match self {
            SourceKind::Store => "Store Customer",
            SourceKind::Reddit => "Reddit User",
            SourceKind::Forum => "Forum User",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The product a request is harvesting reviews for. Referenced, never
/// mutated; product records are owned by the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
}

impl ProductRef {
    pub fn new(id: Uuid, name: &str, brand: Option<&str>) -> Self {
        Self {
            id,
            name: name.to_string(),
            brand: brand.map(String::from),
        }
    }
}

/// Outcome of one plain-HTTP (or rendered) page fetch. Owned by a single
/// fetch task and discarded after extraction.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub html: String,
    pub render_used: bool,
    pub fetch_error: Option<String>,
}

impl FetchResult {
    pub fn failed(url: &str, error: impl std::fmt::Display) -> Self {
        Self {
            url: url.to_string(),
            html: String::new(),
            render_used: false,
            fetch_error: Some(error.to_string()),
        }
    }
}

/// A block of opinion-bearing text pulled out of a page, before dedup and
/// validation. Construction enforces the per-candidate length bounds and
/// the opinion-token requirement; anything else never becomes a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub text: String,
    pub source_kind: SourceKind,
    pub source_url: String,
    pub author: Option<String>,
    pub rating_hint: Option<f32>,
    pub extracted_at: DateTime<Utc>,
}

/// Canonical review record, the unit persisted and returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedReview {
    pub source: SourceKind,
    pub source_review_id: String,
    pub author: String,
    pub content: String,
    pub title: Option<String>,
    pub rating: Option<f32>,
    pub url: String,
    pub confidence: f32,
    pub fetched_at: DateTime<Utc>,
}

/// Sha256 hex digest of a string. Used for exact-dedup fingerprints and
/// stable per-source review ids.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
