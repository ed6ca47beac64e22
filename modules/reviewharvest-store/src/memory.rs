// In-memory store for tests and dry runs. Same unique-key semantics as
// the Postgres implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use reviewharvest_common::{SourceKind, ValidatedReview};

use crate::error::Result;
use crate::ReviewStore;

#[derive(Default)]
pub struct MemoryReviewStore {
    rows: Mutex<HashMap<(Uuid, SourceKind, String), ValidatedReview>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn upsert_reviews(
        &self,
        product_id: Uuid,
        reviews: &[ValidatedReview],
    ) -> Result<u64> {
        let mut rows = self.rows.lock().expect("store lock");
        for review in reviews {
            let key = (product_id, review.source, review.source_review_id.clone());
            rows.insert(key, review.clone());
        }
        Ok(reviews.len() as u64)
    }

    async fn fresh_reviews(
        &self,
        product_id: Uuid,
        source: SourceKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<ValidatedReview>> {
        let rows = self.rows.lock().expect("store lock");
        Ok(rows
            .iter()
            .filter(|((pid, src, _), review)| {
                *pid == product_id && *src == source && review.fetched_at >= since
            })
            .map(|(_, review)| review.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(source: SourceKind, id: &str, fetched_at: DateTime<Utc>) -> ValidatedReview {
        ValidatedReview {
            source,
            source_review_id: id.to_string(),
            author: "someone".to_string(),
            content: "Solid product, would buy again.".to_string(),
            title: None,
            rating: None,
            url: "https://example.com/r/1".to_string(),
            confidence: 0.9,
            fetched_at,
        }
    }

    #[tokio::test]
    async fn upsert_is_keyed_on_source_and_review_id() {
        let store = MemoryReviewStore::new();
        let product = Uuid::new_v4();
        let now = Utc::now();

        store
            .upsert_reviews(product, &[review(SourceKind::Reddit, "abc", now)])
            .await
            .unwrap();
        store
            .upsert_reviews(product, &[review(SourceKind::Reddit, "abc", now)])
            .await
            .unwrap();
        store
            .upsert_reviews(product, &[review(SourceKind::Forum, "abc", now)])
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn fresh_reviews_filters_by_cutoff() {
        let store = MemoryReviewStore::new();
        let product = Uuid::new_v4();
        let now = Utc::now();
        let stale = now - chrono::Duration::days(10);

        store
            .upsert_reviews(
                product,
                &[
                    review(SourceKind::Reddit, "recent", now),
                    review(SourceKind::Reddit, "old", stale),
                ],
            )
            .await
            .unwrap();

        let fresh = store
            .fresh_reviews(product, SourceKind::Reddit, now - chrono::Duration::days(7))
            .await
            .unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].source_review_id, "recent");
    }
}
