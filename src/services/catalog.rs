//! Catalog management service: books, authors and the landing summary

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetail, AuthorForm},
        book::{Book, BookDetail, BookForm, BookFormContext, BookShort},
        stats::CatalogCounts,
    },
    pagination::Page,
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Aggregate counts for the landing page
    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        self.repository.stats.catalog_counts().await
    }

    /// Database connectivity probe
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.stats.ping().await
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, page: &Page) -> AppResult<(Vec<BookShort>, i64)> {
        let (books, total) = self.repository.books.list(page).await?;
        page.ensure_exists(total)?;
        Ok((books, total))
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        self.repository.books.get_detail(id).await
    }

    /// Form context with choices; pre-filled from the stored book when `id` is given
    pub async fn book_form(&self, id: Option<i32>) -> AppResult<BookFormContext> {
        let form = match id {
            Some(id) => {
                let book = self.repository.books.get_by_id(id).await?;
                let genre_ids = self
                    .repository
                    .books
                    .get_genres(id)
                    .await?
                    .into_iter()
                    .map(|g| g.id)
                    .collect();
                BookForm::from_book(&book, genre_ids)
            }
            None => BookForm::default(),
        };

        Ok(BookFormContext {
            form,
            authors: self.repository.authors.list_all().await?,
            genres: self.repository.taxonomy.list_genres().await?,
            languages: self.repository.taxonomy.list_languages().await?,
        })
    }

    /// Create a book after validation and the ISBN uniqueness check
    pub async fn create_book(&self, form: BookForm) -> AppResult<Book> {
        form.validate()?;
        self.ensure_isbn_free(&form, None).await?;

        let book = self.repository.books.create(&form).await?;
        tracing::info!("Catalog: created book id={} isbn={}", book.id, book.isbn);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, form: BookForm) -> AppResult<Book> {
        // 404 before 400 for a missing book
        self.repository.books.get_by_id(id).await?;
        form.validate()?;
        self.ensure_isbn_free(&form, Some(id)).await?;

        let book = self.repository.books.update(id, &form).await?;
        tracing::info!("Catalog: updated book id={}", id);
        Ok(book)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Catalog: deleted book id={}", id);
        Ok(())
    }

    async fn ensure_isbn_free(&self, form: &BookForm, exclude_id: Option<i32>) -> AppResult<()> {
        if let Some(ref isbn) = form.isbn {
            if self.repository.books.isbn_taken(isbn, exclude_id).await? {
                return Err(AppError::Conflict(format!(
                    "A book with ISBN {} already exists",
                    isbn
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: &Page) -> AppResult<(Vec<Author>, i64)> {
        let (authors, total) = self.repository.authors.list(page).await?;
        page.ensure_exists(total)?;
        Ok((authors, total))
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetail { author, books })
    }

    pub async fn author_form(&self, id: i32) -> AppResult<AuthorForm> {
        let author = self.repository.authors.get_by_id(id).await?;
        Ok(AuthorForm::from(&author))
    }

    pub async fn create_author(&self, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        let author = self.repository.authors.create(&form).await?;
        tracing::info!("Catalog: created author id={} ({})", author.id, author.display_name());
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, form: AuthorForm) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await?;
        form.validate()?;
        let author = self.repository.authors.update(id, &form).await?;
        tracing::info!("Catalog: updated author id={}", id);
        Ok(author)
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Catalog: deleted author id={}", id);
        Ok(())
    }
}
