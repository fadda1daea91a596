//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod loans;
pub mod stats;
pub mod taxonomy;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub stats: stats::StatsRepository,
    pub taxonomy: taxonomy::TaxonomyRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            stats: stats::StatsRepository::new(pool.clone()),
            taxonomy: taxonomy::TaxonomyRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Kind of integrity constraint a failed write ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
    Check,
}

pub(crate) fn constraint_kind(err: &sqlx::Error) -> Option<Constraint> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    if db.is_unique_violation() {
        Some(Constraint::Unique)
    } else if db.is_foreign_key_violation() {
        Some(Constraint::ForeignKey)
    } else if db.is_check_violation() {
        Some(Constraint::Check)
    } else {
        None
    }
}
