//! Books currently on loan

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

/// List borrowed books with their borrower, latest loans first
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of borrowed books", body = PaginatedResponse<BorrowedBook>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_borrowed(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowedBook>>> {
    let page = PageRequest::resolve(query.page, query.limit, &state.config.pagination);
    let (books, total) = state.services.books.list_borrowed(page).await?;

    Ok(Json(PaginatedResponse {
        data: books,
        pagination: Pagination::new(total, page),
    }))
}
