//! Global search across books and users

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{book::Book, user::User},
    AppState,
};

use super::{ApiQuery, Session};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive term
    pub query: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub books: Vec<Book>,
    pub users: Vec<User>,
}

/// Search books (title, author, category, description) and users (name, email)
#[utoipa::path(
    get,
    path = "/search",
    tag = "search",
    security(("bearer_auth" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books and users", body = SearchResponse),
        (status = 400, description = "Search query is required", body = crate::error::ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let (books, users) = state
        .services
        .search
        .search(params.query.as_deref(), state.config.pagination.search_limit)
        .await?;

    Ok(Json(SearchResponse { books, users }))
}
