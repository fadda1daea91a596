//! Genres and languages repository

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{genre::Genre, language::Language},
};

#[derive(Clone)]
pub struct TaxonomyRepository {
    pool: Pool<Postgres>,
}

impl TaxonomyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let languages = sqlx::query_as::<_, Language>("SELECT id, name FROM languages ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(languages)
    }
}
