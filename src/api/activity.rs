//! Activity feed endpoint

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        activity::Activity,
        pagination::{PageQuery, PageRequest, Pagination},
    },
    AppState,
};

use super::{ApiQuery, PaginatedResponse, Session};

/// Recent activity, newest first
#[utoipa::path(
    get,
    path = "/activity",
    tag = "activity",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of activity entries", body = PaginatedResponse<Activity>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Activity>>> {
    let page = PageRequest::resolve(query.page, query.limit, &state.config.pagination);
    let (entries, total) = state.services.activity.list_activities(page).await?;

    Ok(Json(PaginatedResponse {
        data: entries,
        pagination: Pagination::new(total, page),
    }))
}
