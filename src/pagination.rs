//! Page arithmetic shared by list views

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{Author, BookShort, BorrowedCopy},
};

/// `?page=N` query parameter (1-based)
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
}

/// A requested page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub fn new(number: Option<i64>, size: i64) -> AppResult<Self> {
        let number = number.unwrap_or(1);
        let size = size.max(1);
        // The row offset must fit the OFFSET bind
        if number < 1 || (number - 1).checked_mul(size).is_none() {
            return Err(AppError::NotFound(format!("Invalid page ({})", number)));
        }
        Ok(Self { number, size })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    /// Number of pages for `total` rows; an empty listing still has page 1
    pub fn num_pages(&self, total: i64) -> i64 {
        ((total + self.size - 1) / self.size).max(1)
    }

    /// Pages past the end are not found
    pub fn ensure_exists(&self, total: i64) -> AppResult<()> {
        if self.number > self.num_pages(total) {
            return Err(AppError::NotFound(format!(
                "Invalid page ({}): that page contains no results",
                self.number
            )));
        }
        Ok(())
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    BookPage = PaginatedResponse<BookShort>,
    AuthorPage = PaginatedResponse<Author>,
    LoanPage = PaginatedResponse<BorrowedCopy>
)]
pub struct PaginatedResponse<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Total number of records
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Records per page
    pub per_page: i64,
    pub num_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.number,
            per_page: page.size,
            num_pages: page.num_pages(total),
        }
    }
}
