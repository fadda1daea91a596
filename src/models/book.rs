//! Book model and related types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::Author, book_instance::BookInstance, genre::Genre, language::Language,
};

/// ISBN-10 (check digit may be X) or ISBN-13 with a 978/979 prefix
static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{9}[\dX]|97[89]\d{10})$").expect("valid ISBN regex"));

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: i32,
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    /// "Last, First" of the author, if any
    pub author: Option<String>,
}

/// Book with its relations resolved
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub instances: Vec<BookInstance>,
}

/// Create/update book form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(required(message = "This field is required."), length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub author_id: Option<i32>,
    #[validate(required(message = "This field is required."), length(min = 1, max = 1000))]
    pub summary: Option<String>,
    #[validate(
        required(message = "This field is required."),
        regex(path = *ISBN_RE, message = "Enter a 10 or 13 character ISBN")
    )]
    pub isbn: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Select at least one genre"))]
    pub genre_ids: Vec<i32>,
    #[validate(required(message = "This field is required."))]
    pub language_id: Option<i32>,
}

impl BookForm {
    /// Build the update form from a stored book and its genre links
    pub fn from_book(book: &Book, genre_ids: Vec<i32>) -> Self {
        Self {
            title: Some(book.title.clone()),
            author_id: book.author_id,
            summary: Some(book.summary.clone()),
            isbn: Some(book.isbn.clone()),
            genre_ids,
            language_id: Some(book.language_id),
        }
    }
}

/// Everything a client needs to render a book form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookFormContext {
    pub form: BookForm,
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
    pub languages: Vec<Language>,
}
