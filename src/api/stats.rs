//! Dashboard statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::stats::DashboardStats, AppState};

use super::Session;

/// Dashboard counters and recent additions
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Session(_session): Session,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard().await?;
    Ok(Json(stats))
}
