// Read-only product lookup. Product records are owned by the surrounding
// application; the pipeline only references them.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use reviewharvest_common::ProductRef;

use crate::error::Result;

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product_by_id(&self, id: Uuid) -> Result<Option<ProductRef>>;
}

pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn product_by_id(&self, id: Uuid) -> Result<Option<ProductRef>> {
        let row = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT name, brand FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name, brand)| ProductRef {
            id,
            name,
            brand,
        }))
    }
}
