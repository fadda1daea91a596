//! HTTP layer: routes, guards and OpenAPI docs

pub mod authors;
pub mod books;
pub mod guard;
pub mod health;
pub mod index;
pub mod loans;
pub mod openapi;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Mount point of the versioned API; redirects are built against it
pub const API_PREFIX: &str = "/api/v1";

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Landing page
        .route("/", get(index::index))
        // Books
        .route("/books", get(books::list_books))
        .route("/books/create", get(books::book_create_form).post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/update", get(books::book_update_form).post(books::update_book))
        .route("/books/:id/delete", get(books::book_delete_form).post(books::delete_book))
        .route("/books/:id/instances", post(books::create_instance))
        // Authors
        .route("/authors", get(authors::list_authors))
        .route("/authors/create", get(authors::author_create_form).post(authors::create_author))
        .route("/authors/:id", get(authors::get_author))
        .route("/authors/:id/update", get(authors::author_update_form).post(authors::update_author))
        .route("/authors/:id/delete", get(authors::author_delete_form).post(authors::delete_author))
        // Loans
        .route("/mybooks", get(loans::my_loans))
        .route("/borrowed", get(loans::all_loans))
        .route("/bookinstances/:id/renew", get(loans::renew_form).post(loans::renew))
        .route("/bookinstances/:id/lend", post(loans::lend))
        .route("/bookinstances/:id/return", post(loans::return_copy))
        .with_state(state);

    Router::new()
        .nest(API_PREFIX, api_v1)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
