//! Catalog summary figures

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Aggregate record counts shown on the landing page
#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
}
