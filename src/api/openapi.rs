//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, health, index, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "0.3.0",
        description = "Catalog of books, authors and lendable copies with loan tracking"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        index::index,
        // Books
        books::list_books,
        books::get_book,
        books::book_create_form,
        books::create_book,
        books::book_update_form,
        books::update_book,
        books::book_delete_form,
        books::delete_book,
        books::create_instance,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::author_create_form,
        authors::create_author,
        authors::author_update_form,
        authors::update_author,
        authors::author_delete_form,
        authors::delete_author,
        // Loans
        loans::my_loans,
        loans::all_loans,
        loans::renew_form,
        loans::renew,
        loans::lend,
        loans::return_copy,
    ),
    components(
        schemas(
            index::IndexResponse,
            crate::models::stats::CatalogCounts,
            // Books
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookDetail,
            crate::models::book::BookForm,
            crate::models::book::BookFormContext,
            crate::models::genre::Genre,
            crate::models::language::Language,
            crate::pagination::BookPage,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorDetail,
            crate::models::author::AuthorForm,
            crate::pagination::AuthorPage,
            // Copies and loans
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BorrowedCopy,
            crate::models::book_instance::LendRequest,
            crate::models::book_instance::CreateInstance,
            crate::forms::RenewBookForm,
            crate::forms::RenewalFormResponse,
            crate::pagination::LoanPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog summary"),
        (name = "books", description = "Books and their copies"),
        (name = "authors", description = "Authors"),
        (name = "loans", description = "Borrowed copies, renewals and returns")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
