//! Review persistence. The `(product_id, source, source_review_id)` unique
//! key is the mechanism that resolves concurrent-insert races: a second
//! writer's insert becomes an update-in-place, never an error.

mod catalog;
pub mod error;
mod memory;
mod postgres;

pub use catalog::{PgProductCatalog, ProductCatalog};
pub use error::{Result, StoreError};
pub use memory::MemoryReviewStore;
pub use postgres::PgReviewStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use reviewharvest_common::{SourceKind, ValidatedReview};

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Upsert reviews for a product. Collisions on the unique key update
    /// in place. Returns the number of rows written.
    async fn upsert_reviews(
        &self,
        product_id: Uuid,
        reviews: &[ValidatedReview],
    ) -> Result<u64>;

    /// Reviews for a product/source fetched at or after `since`.
    async fn fresh_reviews(
        &self,
        product_id: Uuid,
        source: SourceKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<ValidatedReview>>;
}
