//! API handlers for Shelfkeeper REST endpoints

pub mod activity;
pub mod analytics;
pub mod books;
pub mod borrowed;
pub mod health;
pub mod openapi;
pub mod overdue;
pub mod search;
pub mod stats;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{pagination::Pagination, user::SessionClaims},
    AppState,
};

/// JSON body extractor whose rejections use the `{ "error": ... }` body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the `{ "error": ... }` body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections use the `{ "error": ... }` body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Rows of the requested page
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Unpaginated list wrapper
#[derive(Serialize, ToSchema)]
pub struct ListResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub data: Vec<T>,
}

/// `?id=` form used by the dashboard for deletes
#[derive(Debug, Deserialize, IntoParams)]
pub struct IdQuery {
    pub id: Option<Uuid>,
}

/// Verified session of the caller.
///
/// The token comes from `Authorization: Bearer <token>` or, failing that,
/// from the session cookie set by the auth provider.
pub struct Session(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts, &state.config.auth.cookie_name))
            .ok_or_else(|| AppError::Authentication("Unauthorized".to_string()))?;

        let claims = SessionClaims::from_token(&token, &state.config.auth.session_secret).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            AppError::Authentication("Unauthorized".to_string())
        })?;

        Ok(Session(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn cookie_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route(
            "/books",
            get(books::list_books)
                .post(books::create_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book_by_id)
                .delete(books::delete_book_by_id),
        )
        // Users
        .route(
            "/users",
            get(users::list_users)
                .post(users::create_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user_by_id)
                .delete(users::delete_user_by_id),
        )
        .route("/users/:id/books", get(users::get_user_books))
        // Circulation
        .route("/borrowed", get(borrowed::list_borrowed))
        .route("/overdue", get(overdue::list_overdue))
        // Activity log
        .route("/activity", get(activity::list_activities))
        // Search
        .route("/search", get(search::search))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .route("/analytics", get(analytics::get_analytics))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/books");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            bearer_token(&parts(&[("authorization", "Bearer abc.def.ghi")])),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(bearer_token(&parts(&[("authorization", "Basic Zm9vOmJhcg==")])), None);
        assert_eq!(bearer_token(&parts(&[("authorization", "Bearer ")])), None);
        assert_eq!(bearer_token(&parts(&[])), None);
    }

    #[test]
    fn test_cookie_token_extraction() {
        let p = parts(&[("cookie", "theme=dark; shelfkeeper.session_token=tok123; other=1")]);
        assert_eq!(cookie_token(&p, "shelfkeeper.session_token"), Some("tok123".to_string()));
        assert_eq!(cookie_token(&p, "missing"), None);
    }
}
