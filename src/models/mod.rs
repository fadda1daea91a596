//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetail, AuthorForm};
pub use book::{Book, BookDetail, BookForm, BookShort};
pub use book_instance::{BookInstance, BorrowedCopy, LoanStatus};
pub use genre::Genre;
pub use language::Language;
pub use user::{Permission, UserClaims};
