//! User management endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::LoanedBook,
        pagination::{PageRequest, Pagination},
        user::{CreateUser, UpdateUser, User, UserQuery},
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, IdQuery, ListResponse, PaginatedResponse, Session};

/// List users with search and pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Page of users", body = PaginatedResponse<User>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let page = PageRequest::resolve(query.page, query.limit, &state.config.pagination);
    let (users, total) = state
        .services
        .users
        .list_users(query.search.as_deref(), page)
        .await?;

    Ok(Json(PaginatedResponse {
        data: users,
        pagination: Pagination::new(total, page),
    }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<User>> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(user))
}

/// Books a user currently holds
#[utoipa::path(
    get,
    path = "/users/{id}/books",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Current loans, flagged when overdue", body = ListResponse<LoanedBook>),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_books(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ListResponse<LoanedBook>>> {
    let books = state.services.books.user_loans(id).await?;
    Ok(Json(ListResponse { data: books }))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiJson(request): ApiJson<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user (ID in the body)
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid input or email taken", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiJson(request): ApiJson<UpdateUser>,
) -> AppResult<Json<User>> {
    let id = request.id.ok_or_else(user_id_required)?;
    let user = state.services.users.update_user(id, request).await?;
    Ok(Json(user))
}

/// Update a user by ID
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid input or email taken", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user_by_id(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateUser>,
) -> AppResult<Json<User>> {
    if request.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::BadRequest("User ID in body does not match the path".to_string()));
    }
    let user = state.services.users.update_user(id, request).await?;
    Ok(Json(user))
}

/// Delete a user (`?id=`)
#[utoipa::path(
    delete,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(IdQuery),
    responses(
        (status = 200, description = "Deleted user", body = User),
        (status = 400, description = "Missing ID or user holds borrowed books", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiQuery(params): ApiQuery<IdQuery>,
) -> AppResult<Json<User>> {
    let id = params.id.ok_or_else(user_id_required)?;
    let user = state.services.users.delete_user(id).await?;
    Ok(Json(user))
}

/// Delete a user by ID
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted user", body = User),
        (status = 400, description = "User holds borrowed books", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user_by_id(
    State(state): State<AppState>,
    Session(_session): Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<User>> {
    let user = state.services.users.delete_user(id).await?;
    Ok(Json(user))
}

fn user_id_required() -> AppError {
    AppError::BadRequest("User ID is required".to_string())
}
