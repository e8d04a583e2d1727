//! Chart series for the analytics page

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::stats::{AnalyticsData, AnalyticsQuery},
    AppState,
};

use super::{ApiQuery, Session};

/// One chart series selected by `type`
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Series for the requested chart", body = AnalyticsData),
        (status = 400, description = "Invalid analytics type", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> AppResult<Json<AnalyticsData>> {
    let data = state.services.stats.analytics(query.kind.as_deref()).await?;
    Ok(Json(data))
}
