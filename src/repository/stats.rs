//! Aggregate counts over the catalog

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{book_instance::LoanStatus, stats::CatalogCounts},
};

#[derive(Clone)]
pub struct StatsRepository {
    pool: Pool<Postgres>,
}

impl StatsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record counts for the landing page, in a single round trip
    pub async fn catalog_counts(&self) -> AppResult<CatalogCounts> {
        let counts = sqlx::query_as::<_, CatalogCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS num_books,
                (SELECT COUNT(*) FROM book_instances) AS num_instances,
                (SELECT COUNT(*) FROM book_instances WHERE status = $1) AS num_instances_available,
                (SELECT COUNT(*) FROM authors) AS num_authors,
                (SELECT COUNT(*) FROM genres) AS num_genres
            "#,
        )
        .bind(LoanStatus::Available)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    /// Connectivity probe used by the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
