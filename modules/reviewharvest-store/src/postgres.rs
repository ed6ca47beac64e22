// Postgres persistence for validated reviews.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use reviewharvest_common::{SourceKind, ValidatedReview};

use crate::error::Result;
use crate::ReviewStore;

pub struct PgReviewStore {
    pool: PgPool,
}

/// A row from the reviews table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ReviewRow {
    source: String,
    source_review_id: String,
    author: String,
    content: String,
    title: Option<String>,
    rating: Option<f32>,
    url: String,
    confidence: f32,
    fetched_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Option<ValidatedReview> {
        let source = SourceKind::parse(&self.source)?;
        Some(ValidatedReview {
            source,
            source_review_id: self.source_review_id,
            author: self.author,
            content: self.content,
            title: self.title,
            rating: self.rating,
            url: self.url,
            confidence: self.confidence,
            fetched_at: self.fetched_at,
        })
    }
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn upsert_reviews(
        &self,
        product_id: Uuid,
        reviews: &[ValidatedReview],
    ) -> Result<u64> {
        let mut written = 0u64;
        for review in reviews {
            let result = sqlx::query(
                r#"
                INSERT INTO reviews
                    (product_id, source, source_review_id, author, content,
                     title, rating, url, confidence, fetched_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (product_id, source, source_review_id)
                DO UPDATE SET
                    author = EXCLUDED.author,
                    content = EXCLUDED.content,
                    title = EXCLUDED.title,
                    rating = EXCLUDED.rating,
                    url = EXCLUDED.url,
                    confidence = EXCLUDED.confidence,
                    fetched_at = EXCLUDED.fetched_at
                "#,
            )
            .bind(product_id)
            .bind(review.source.as_str())
            .bind(&review.source_review_id)
            .bind(&review.author)
            .bind(&review.content)
            .bind(&review.title)
            .bind(review.rating)
            .bind(&review.url)
            .bind(review.confidence)
            .bind(review.fetched_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => written += 1,
                Err(e) => {
                    // One bad row shouldn't abort the batch
                    warn!(
                        source = review.source.as_str(),
                        review_id = %review.source_review_id,
                        error = %e,
                        "Failed to upsert review"
                    );
                }
            }
        }
        Ok(written)
    }

    async fn fresh_reviews(
        &self,
        product_id: Uuid,
        source: SourceKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<ValidatedReview>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT source, source_review_id, author, content,
                   title, rating, url, confidence, fetched_at
            FROM reviews
            WHERE product_id = $1 AND source = $2 AND fetched_at >= $3
            ORDER BY fetched_at DESC
            "#,
        )
        .bind(product_id)
        .bind(source.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(ReviewRow::into_review).collect())
    }
}
