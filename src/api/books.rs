//! Book catalog endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        pagination::{PageRequest, Pagination},
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, IdQuery, PaginatedResponse, Session};

/// List books with search, status filter and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books", body = PaginatedResponse<Book>),
        (status = 400, description = "Invalid status filter", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(query): ApiQuery<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let page = PageRequest::resolve(query.page, query.limit, &state.config.pagination);
    let (books, total) = state.services.books.list_books(&query, page).await?;

    Ok(Json(PaginatedResponse {
        data: books,
        pagination: Pagination::new(total, page),
    }))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_book(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Title, author or category missing", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Session(session): Session,
    ApiJson(request): ApiJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create_book(request, session.sub).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book (ID in the body); also performs borrow and return
#[utoipa::path(
    put,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Missing ID or invalid fields", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Status changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiJson(request): ApiJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let id = request.id.ok_or_else(book_id_required)?;
    let book = state.services.books.update_book(id, request).await?;
    Ok(Json(book))
}

/// Update a book by ID
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or borrower not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Status changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book_by_id(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    if request.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::BadRequest("Book ID in body does not match the path".to_string()));
    }
    let book = state.services.books.update_book(id, request).await?;
    Ok(Json(book))
}

/// Delete a book (`?id=`)
#[utoipa::path(
    delete,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(IdQuery),
    responses(
        (status = 200, description = "Deleted book", body = Book),
        (status = 400, description = "Missing ID or book is borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(params): ApiQuery<IdQuery>,
) -> AppResult<Json<Book>> {
    let id = params.id.ok_or_else(book_id_required)?;
    let book = state.services.books.delete_book(id).await?;
    Ok(Json(book))
}

/// Delete a book by ID
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Deleted book", body = Book),
        (status = 400, description = "Book is borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book_by_id(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.delete_book(id).await?;
    Ok(Json(book))
}

fn book_id_required() -> AppError {
    AppError::BadRequest("Book ID is required".to_string())
}
