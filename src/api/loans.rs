//! Circulation endpoints: checkout, return, renewal and loan lists

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::instance::{BookInstance, LoanQuery, LoanedCopy},
    repository,
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// Checkout request
#[derive(Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// The borrowing user
    pub borrower_id: i32,
    /// Due-back date; defaults to three weeks from today
    pub due_back: Option<NaiveDate>,
}

/// Renewal request, a single calendar date
#[derive(Deserialize, ToSchema)]
pub struct RenewRequest {
    /// Proposed new due-back date
    pub renewal_date: NaiveDate,
}

/// Default date a renewal form should propose for a copy
#[derive(Serialize, ToSchema)]
pub struct RenewalProposal {
    /// The copy being renewed
    pub instance: BookInstance,
    /// Proposed date, three weeks from today
    pub proposed_renewal_date: NaiveDate,
}

/// Copies currently borrowed by the caller, due-back ascending
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "The caller's active loans", body = PaginatedResponse<LoanedCopy>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanedCopy>>> {
    let page = query.page.unwrap_or(1).max(1);
    let (loans, total) = state.services.loans.user_loans(claims.user_id, page).await?;

    Ok(Json(PaginatedResponse {
        items: loans,
        total,
        page,
        per_page: repository::instances::PAGE_SIZE,
    }))
}

/// Every copy currently on loan, due-back ascending (staff view)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "All active loans", body = PaginatedResponse<LoanedCopy>),
        (status = 403, description = "Missing capability")
    )
)]
pub async fn all_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanedCopy>>> {
    claims.require_mark_returned()?;

    let page = query.page.unwrap_or(1).max(1);
    let (loans, total) = state.services.loans.all_loans(page).await?;

    Ok(Json(PaginatedResponse {
        items: loans,
        total,
        page,
        per_page: repository::instances::PAGE_SIZE,
    }))
}

/// Loans of a specific user. Borrowers may query themselves; anyone else's
/// loans require the capability.
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID"),
        LoanQuery
    ),
    responses(
        (status = 200, description = "The user's active loans", body = PaginatedResponse<LoanedCopy>),
        (status = 403, description = "Not the caller and missing capability"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanedCopy>>> {
    claims.require_self_or_mark_returned(user_id)?;

    let page = query.page.unwrap_or(1).max(1);
    let (loans, total) = state.services.loans.user_loans(user_id, page).await?;

    Ok(Json(PaginatedResponse {
        items: loans,
        total,
        page,
        per_page: repository::instances::PAGE_SIZE,
    }))
}

/// Check a copy out to a borrower
#[utoipa::path(
    post,
    path = "/instances/{id}/checkout",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy UUID")
    ),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Copy checked out", body = BookInstance),
        (status = 404, description = "Copy or borrower not found"),
        (status = 422, description = "Copy is not available")
    )
)]
pub async fn checkout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<BookInstance>> {
    claims.require_mark_returned()?;

    let instance = state
        .services
        .loans
        .checkout(id, request.borrower_id, request.due_back)
        .await?;
    Ok(Json(instance))
}

/// Mark a copy as returned: it becomes available again
#[utoipa::path(
    post,
    path = "/instances/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy UUID")
    ),
    responses(
        (status = 200, description = "Copy returned", body = BookInstance),
        (status = 404, description = "Copy not found"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn return_copy(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    claims.require_mark_returned()?;

    let instance = state.services.loans.return_copy(id).await?;
    Ok(Json(instance))
}

/// Default renewal proposal for a copy (three weeks from today)
#[utoipa::path(
    get,
    path = "/instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy UUID")
    ),
    responses(
        (status = 200, description = "Proposed renewal date", body = RenewalProposal),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renewal_proposal(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalProposal>> {
    claims.require_mark_returned()?;

    let (instance, proposed_renewal_date) = state.services.loans.proposed_renewal(id).await?;
    Ok(Json(RenewalProposal {
        instance,
        proposed_renewal_date,
    }))
}

/// Renew a loan: set a new due-back date within the four-week window.
/// The copy stays on loan.
#[utoipa::path(
    post,
    path = "/instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy UUID")
    ),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Loan renewed", body = BookInstance),
        (status = 400, description = "Date in the past or beyond four weeks"),
        (status = 404, description = "Copy not found"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn renew(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewRequest>,
) -> AppResult<Json<BookInstance>> {
    claims.require_mark_returned()?;

    let instance = state.services.loans.renew(id, request.renewal_date).await?;
    Ok(Json(instance))
}
