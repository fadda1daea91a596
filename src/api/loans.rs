//! Loan endpoints: borrowed lists, renewal, lending and returns

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::{field_messages, AppResult},
    forms::{RenewBookForm, RenewalFormResponse},
    models::book_instance::{BookInstance, LendRequest},
    pagination::{LoanPage, Page, PageQuery, PaginatedResponse},
    services::loans::{LoansService, RenewalOutcome},
    AppState,
};

use super::{
    guard::{CanMarkReturned, LoginRequired, PermissionRequired},
    API_PREFIX,
};

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's borrowed copies, soonest due first", body = LoanPage),
        (status = 302, description = "Not logged in")
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    LoginRequired(claims): LoginRequired,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<LoanPage>> {
    let page = Page::new(query.page, state.config.catalog.page_size)?;
    let (copies, total) = state.services.loans.borrowed_by(claims.user_id, &page).await?;
    Ok(Json(PaginatedResponse::new(copies, total, page)))
}

/// Every copy on loan, for staff
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All borrowed copies, soonest due first", body = LoanPage),
        (status = 302, description = "Not logged in"),
        (status = 403, description = "Missing catalog.can_mark_returned")
    )
)]
pub async fn all_loans(
    State(state): State<AppState>,
    _staff: PermissionRequired<CanMarkReturned>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<LoanPage>> {
    let page = Page::new(query.page, state.config.catalog.page_size)?;
    let (copies, total) = state.services.loans.all_borrowed(&page).await?;
    Ok(Json(PaginatedResponse::new(copies, total, page)))
}

/// Renewal form with the proposed date
#[utoipa::path(
    get,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Unbound renewal form", body = RenewalFormResponse),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    _staff: PermissionRequired<CanMarkReturned>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalFormResponse>> {
    let loans = &state.services.loans;
    let book_instance = loans.get_instance(id).await?;
    let initial = RenewBookForm::initial(loans.policy(), LoansService::today());

    Ok(Json(RenewalFormResponse {
        book_instance,
        renewal_date: initial.renewal_date,
        help_text: loans.policy().help_text(),
        errors: BTreeMap::new(),
    }))
}

/// Submit a renewal date; on success redirect to the borrowed list
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = RenewBookForm,
    responses(
        (status = 303, description = "Renewed, redirect to all borrowed copies"),
        (status = 400, description = "Form re-displayed with errors", body = RenewalFormResponse),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    _staff: PermissionRequired<CanMarkReturned>,
    Path(id): Path<Uuid>,
    Json(form): Json<RenewBookForm>,
) -> AppResult<Response> {
    let loans = &state.services.loans;

    match loans.renew(id, &form).await? {
        RenewalOutcome::Renewed(_) => {
            Ok(Redirect::to(&format!("{}/borrowed", API_PREFIX)).into_response())
        }
        RenewalOutcome::Invalid(book_instance, errors) => {
            let body = RenewalFormResponse {
                book_instance,
                renewal_date: form.renewal_date,
                help_text: loans.policy().help_text(),
                errors: field_messages(&errors),
            };
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

/// Put an available copy on loan
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/lend",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = LendRequest,
    responses(
        (status = 200, description = "Copy lent", body = BookInstance),
        (status = 400, description = "Unknown borrower"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not available")
    )
)]
pub async fn lend(
    State(state): State<AppState>,
    _staff: PermissionRequired<CanMarkReturned>,
    Path(id): Path<Uuid>,
    Json(request): Json<LendRequest>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.lend(id, &request).await?;
    Ok(Json(instance))
}

/// Mark an on-loan copy as returned
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy back on the shelf", body = BookInstance),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn return_copy(
    State(state): State<AppState>,
    _staff: PermissionRequired<CanMarkReturned>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.mark_returned(id).await?;
    Ok(Json(instance))
}
