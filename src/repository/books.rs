//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookDetail, BookForm, BookShort},
        book_instance::BookInstance,
        genre::Genre,
        language::Language,
    },
    pagination::Page,
};

use super::{constraint_kind, Constraint};

/// Author display column shared by the short-book queries
const BOOK_SHORT_COLUMNS: &str = r#"
    b.id, b.title,
    CASE WHEN a.id IS NULL THEN NULL ELSE a.last_name || ', ' || a.first_name END AS author
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// List one page of books, with the total count
    pub async fn list(&self, page: &Page) -> AppResult<(Vec<BookShort>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {} FROM books b LEFT JOIN authors a ON a.id = b.author_id ORDER BY b.id LIMIT $1 OFFSET $2",
            BOOK_SHORT_COLUMNS
        );
        let books = sqlx::query_as::<_, BookShort>(&query)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Books attributed to an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let query = format!(
            "SELECT {} FROM books b LEFT JOIN authors a ON a.id = b.author_id WHERE b.author_id = $1 ORDER BY b.title, b.id",
            BOOK_SHORT_COLUMNS
        );
        let books = sqlx::query_as::<_, BookShort>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Get book row by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, summary, isbn, author_id, language_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book with author, language, genres and copies
    pub async fn get_detail(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.get_by_id(id).await?;

        let author = sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death FROM authors WHERE id = $1",
        )
        .bind(book.author_id)
        .fetch_optional(&self.pool)
        .await?;

        let language = sqlx::query_as::<_, Language>("SELECT id, name FROM languages WHERE id = $1")
            .bind(book.language_id)
            .fetch_optional(&self.pool)
            .await?;

        let genres = self.get_genres(id).await?;

        let instances = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT id, book_id, imprint, due_back, status, borrower_id
            FROM book_instances
            WHERE book_id = $1
            ORDER BY imprint, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BookDetail {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genres,
            instances,
        })
    }

    /// Load all genres of a book via the book_genres junction table
    pub async fn get_genres(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    /// Whether another book already uses this ISBN
    pub async fn isbn_taken(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Insert a validated form and its genre links in one transaction
    pub async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, summary, isbn, author_id, language_id
            "#,
        )
        .bind(&form.title)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.author_id)
        .bind(form.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(book.id)
        .bind(&form.genre_ids)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        tx.commit().await?;
        Ok(book)
    }

    /// Overwrite a book and replace its genre links in one transaction
    pub async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, summary = $2, isbn = $3, author_id = $4, language_id = $5
            WHERE id = $6
            RETURNING id, title, summary, isbn, author_id, language_id
            "#,
        )
        .bind(&form.title)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.author_id)
        .bind(form.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&form.genre_ids)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book; refused while copies of it exist
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match constraint_kind(&e) {
                Some(Constraint::ForeignKey) => AppError::Conflict(format!(
                    "Book with id {} still has copies and cannot be deleted",
                    id
                )),
                _ => AppError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

/// Map constraint failures on book writes to client errors
fn write_error(e: sqlx::Error) -> AppError {
    match constraint_kind(&e) {
        Some(Constraint::Unique) => {
            AppError::Conflict("A book with this ISBN already exists".to_string())
        }
        Some(Constraint::ForeignKey) => AppError::Validation(
            "Selected author, language or genre does not exist".to_string(),
        ),
        _ => AppError::Database(e),
    }
}
