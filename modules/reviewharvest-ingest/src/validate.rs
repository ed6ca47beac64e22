//! Validation and normalization. Surviving candidates go to the external
//! classifier in bounded batches; what comes back above the confidence
//! floor is mapped onto the canonical review shape.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use classifier_client::{ClassifierClient, ClassifyItem, Verdict};
use tracing::{info, warn};

use reviewharvest_common::{content_hash, ProductRef, RawCandidate, SourceKind, ValidatedReview};

use crate::config::PipelineConfig;
use crate::dedup::normalize_text;

/// Delay before the single retry of a failed classifier batch.
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// The pipeline-side seam over the external classifier. Batches are
/// bounded by the caller; implementations classify one batch per call.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, items: &[ClassifyItem]) -> Result<Vec<Verdict>>;
}

#[async_trait]
impl Classifier for ClassifierClient {
    async fn classify(&self, items: &[ClassifyItem]) -> Result<Vec<Verdict>> {
        Ok(self.classify_batch(items).await?)
    }
}

/// Classify candidates in batches and keep those at or above the
/// confidence floor, normalized onto the canonical review shape.
///
/// A batch whose classifier call fails is retried once with backoff;
/// persistent failure degrades that batch to pass-through at a lowered
/// default confidence rather than failing the whole request.
pub async fn validate_and_normalize(
    classifier: &dyn Classifier,
    candidates: Vec<RawCandidate>,
    product: &ProductRef,
    config: &PipelineConfig,
) -> Vec<ValidatedReview> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let context = match &product.brand {
        Some(brand) => format!("{} by {}", product.name, brand),
        None => product.name.clone(),
    };

    let batch_size = config
        .classifier_batch_size
        .clamp(1, classifier_client::MAX_BATCH_SIZE);

    let mut reviews = Vec::new();
    let mut dropped = 0usize;

    for batch in candidates.chunks(batch_size) {
        let items: Vec<ClassifyItem> = batch
            .iter()
            .map(|c| ClassifyItem {
                text: c.text.clone(),
                context: context.clone(),
            })
            .collect();

        let verdicts = classify_with_retry(classifier, &items, config).await;

        for (candidate, verdict) in batch.iter().zip(verdicts) {
            if verdict.is_real_review && verdict.confidence >= config.confidence_floor {
                reviews.push(normalize(candidate, verdict.confidence));
            } else {
                // Below-floor items are dropped silently, not an error
                dropped += 1;
            }
        }
    }

    info!(
        kept = reviews.len(),
        dropped,
        product = %product.name,
        "Validated candidates"
    );
    reviews
}

async fn classify_with_retry(
    classifier: &dyn Classifier,
    items: &[ClassifyItem],
    config: &PipelineConfig,
) -> Vec<Verdict> {
    match classifier.classify(items).await {
        Ok(verdicts) => return verdicts,
        Err(e) => {
            warn!(error = %e, batch = items.len(), "Classifier call failed, retrying");
        }
    }

    tokio::time::sleep(RETRY_BACKOFF).await;

    match classifier.classify(items).await {
        Ok(verdicts) => verdicts,
        Err(e) => {
            warn!(
                error = %e,
                batch = items.len(),
                "Classifier retry failed, passing batch through at degraded confidence"
            );
            items
                .iter()
                .map(|_| Verdict {
                    is_real_review: true,
                    confidence: config.degraded_confidence,
                })
                .collect()
        }
    }
}

/// Map a candidate onto the canonical review shape. Field names differ per
/// source; the canonical record reconciles them in one place.
fn normalize(candidate: &RawCandidate, confidence: f32) -> ValidatedReview {
    let source = candidate.source_kind;

    // Reddit/forum data never exposes a numeric rating
    let rating = match source {
        SourceKind::Store => candidate.rating_hint,
        SourceKind::Reddit | SourceKind::Forum => None,
    };

    let author = candidate
        .author
        .clone()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| source.default_author().to_string());

    ValidatedReview {
        source,
        source_review_id: review_id(source, &candidate.text),
        author,
        content: candidate.text.clone(),
        title: None,
        rating,
        url: candidate.source_url.clone(),
        confidence,
        fetched_at: candidate.extracted_at,
    }
}

/// Stable per-source identifier derived from normalized content. The same
/// opinion re-fetched later maps onto the same persisted row.
fn review_id(source: SourceKind, text: &str) -> String {
    let digest = content_hash(&normalize_text(text));
    format!("{}-{}", source.as_str(), &digest[..16])
}
