//! Dashboard (home page) endpoint

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

/// Session id header supplied by the session provider in front of the API
const SESSION_HEADER: &str = "x-session-id";

/// Home-page counters
#[derive(Serialize, ToSchema)]
pub struct DashboardSummary {
    /// Total number of books
    pub num_books: i64,
    /// Total number of copies
    pub num_instances: i64,
    /// Copies currently available
    pub num_instances_available: i64,
    /// Total number of authors
    pub num_authors: i64,
    /// Total number of genres
    pub num_genres: i64,
    /// Books whose title contains " y "
    pub num_books_with_y: i64,
    /// Visits of the caller's session, absent without a session id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_visits: Option<i64>,
}

/// Home-page counters, plus the caller's session visit count
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Catalog counters", body = DashboardSummary)
    )
)]
pub async fn summary(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DashboardSummary>> {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok());

    let summary = state.services.dashboard.summary(session_id).await?;
    Ok(Json(summary))
}
