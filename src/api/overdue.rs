//! Loans past their due date

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        book::BorrowedBook,
        pagination::{PageQuery, PageRequest, Pagination},
    },
    AppState,
};

use super::{ApiQuery, PaginatedResponse, Session};

#[utoipa::path(
    get,
    path = "/overdue",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of overdue books", body = PaginatedResponse<BorrowedBook>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_overdue(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowedBook>>> {
    let page = PageRequest::resolve(query.page, query.limit, &state.config.pagination);
    let (books, total) = state.services.books.list_overdue(page).await?;

    Ok(Json(PaginatedResponse {
        data: books,
        pagination: Pagination::new(total, page),
    }))
}
