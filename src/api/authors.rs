//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::{
    error::AppResult,
    models::author::{AuthorDetail, AuthorForm},
    pagination::{AuthorPage, Page, PageQuery, PaginatedResponse},
    AppState,
};

use super::{guard::AuthorMutationAllowed, API_PREFIX};

/// List authors, 10 per page
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = AuthorPage),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AuthorPage>> {
    let page = Page::new(query.page, state.config.catalog.page_size)?;
    let (authors, total) = state.services.catalog.list_authors(&page).await?;
    Ok(Json(PaginatedResponse::new(authors, total, page)))
}

/// Get author details with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Author form with its initial values
#[utoipa::path(
    get,
    path = "/authors/create",
    tag = "authors",
    responses((status = 200, description = "Initial form values", body = AuthorForm))
)]
pub async fn author_create_form(_gate: AuthorMutationAllowed) -> Json<AuthorForm> {
    Json(AuthorForm::initial())
}

/// Create an author, then redirect to the author's detail view
#[utoipa::path(
    post,
    path = "/authors/create",
    tag = "authors",
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Created, redirect to the author"),
        (status = 400, description = "Form errors")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    _gate: AuthorMutationAllowed,
    Json(form): Json<AuthorForm>,
) -> AppResult<Redirect> {
    let author = state.services.catalog.create_author(form).await?;
    Ok(Redirect::to(&format!("{}/authors/{}", API_PREFIX, author.id)))
}

/// Author form pre-filled with the stored values
#[utoipa::path(
    get,
    path = "/authors/{id}/update",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Current values", body = AuthorForm),
        (status = 404, description = "Author not found")
    )
)]
pub async fn author_update_form(
    State(state): State<AppState>,
    _gate: AuthorMutationAllowed,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorForm>> {
    let form = state.services.catalog.author_form(id).await?;
    Ok(Json(form))
}

/// Update an author, then redirect to the author's detail view
#[utoipa::path(
    post,
    path = "/authors/{id}/update",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Updated, redirect to the author"),
        (status = 400, description = "Form errors"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    _gate: AuthorMutationAllowed,
    Path(id): Path<i32>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Redirect> {
    state.services.catalog.update_author(id, form).await?;
    Ok(Redirect::to(&format!("{}/authors/{}", API_PREFIX, id)))
}

/// Delete confirmation: the author about to be removed
#[utoipa::path(
    get,
    path = "/authors/{id}/delete",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author to delete", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn author_delete_form(
    State(state): State<AppState>,
    _gate: AuthorMutationAllowed,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Delete an author, then redirect to the author list
#[utoipa::path(
    post,
    path = "/authors/{id}/delete",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the list"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    _gate: AuthorMutationAllowed,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.services.catalog.delete_author(id).await?;
    Ok(Redirect::to(&format!("{}/authors", API_PREFIX)))
}
