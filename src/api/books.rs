//! Book endpoints: public listing/detail and permission-gated mutations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookDetail, BookForm, BookFormContext},
        book_instance::{BookInstance, CreateInstance},
    },
    pagination::{BookPage, Page, PageQuery, PaginatedResponse},
    AppState,
};

use super::{
    guard::{CanEdit, PermissionRequired},
    API_PREFIX,
};

/// List books, 10 per page
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = BookPage),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookPage>> {
    let page = Page::new(query.page, state.config.catalog.page_size)?;
    let (books, total) = state.services.catalog.list_books(&page).await?;
    Ok(Json(PaginatedResponse::new(books, total, page)))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Empty book form with author, genre and language choices
#[utoipa::path(
    get,
    path = "/books/create",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Form context", body = BookFormContext),
        (status = 302, description = "Not logged in"),
        (status = 403, description = "Missing catalog.can_edit")
    )
)]
pub async fn book_create_form(
    State(state): State<AppState>,
    _editor: PermissionRequired<CanEdit>,
) -> AppResult<Json<BookFormContext>> {
    let context = state.services.catalog.book_form(None).await?;
    Ok(Json(context))
}

/// Create a book, then redirect to its detail view
#[utoipa::path(
    post,
    path = "/books/create",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Created, redirect to the book"),
        (status = 400, description = "Form errors"),
        (status = 403, description = "Missing catalog.can_edit"),
        (status = 409, description = "ISBN already in use")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    _editor: PermissionRequired<CanEdit>,
    Json(form): Json<BookForm>,
) -> AppResult<Redirect> {
    let book = state.services.catalog.create_book(form).await?;
    Ok(Redirect::to(&format!("{}/books/{}", API_PREFIX, book.id)))
}

/// Book form pre-filled with the stored values
#[utoipa::path(
    get,
    path = "/books/{id}/update",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Form context", body = BookFormContext),
        (status = 403, description = "Missing catalog.can_edit"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_update_form(
    State(state): State<AppState>,
    _editor: PermissionRequired<CanEdit>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookFormContext>> {
    let context = state.services.catalog.book_form(Some(id)).await?;
    Ok(Json(context))
}

/// Update a book, then redirect to its detail view
#[utoipa::path(
    post,
    path = "/books/{id}/update",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 303, description = "Updated, redirect to the book"),
        (status = 400, description = "Form errors"),
        (status = 403, description = "Missing catalog.can_edit"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    _editor: PermissionRequired<CanEdit>,
    Path(id): Path<i32>,
    Json(form): Json<BookForm>,
) -> AppResult<Redirect> {
    state.services.catalog.update_book(id, form).await?;
    Ok(Redirect::to(&format!("{}/books/{}", API_PREFIX, id)))
}

/// Delete confirmation: the book about to be removed
#[utoipa::path(
    get,
    path = "/books/{id}/delete",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book to delete", body = BookDetail),
        (status = 403, description = "Missing catalog.can_edit"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_delete_form(
    State(state): State<AppState>,
    _editor: PermissionRequired<CanEdit>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Delete a book, then redirect to the book list
#[utoipa::path(
    post,
    path = "/books/{id}/delete",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the list"),
        (status = 403, description = "Missing catalog.can_edit"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still has copies")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    _editor: PermissionRequired<CanEdit>,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to(&format!("{}/books", API_PREFIX)))
}

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/instances",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = CreateInstance,
    responses(
        (status = 201, description = "Copy registered", body = BookInstance),
        (status = 403, description = "Missing catalog.can_edit"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    _editor: PermissionRequired<CanEdit>,
    Path(book_id): Path<i32>,
    Json(request): Json<CreateInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    let instance = state.services.loans.create_instance(book_id, &request).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}
