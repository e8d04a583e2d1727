//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{activity, analytics, books, borrowed, health, overdue, search, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfkeeper API",
        version = "0.3.0",
        description = "Library dashboard REST API: catalog, borrowers, circulation and statistics"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::update_book_by_id,
        books::delete_book,
        books::delete_book_by_id,
        // Users
        users::list_users,
        users::get_user,
        users::get_user_books,
        users::create_user,
        users::update_user,
        users::update_user_by_id,
        users::delete_user,
        users::delete_user_by_id,
        // Circulation
        borrowed::list_borrowed,
        overdue::list_overdue,
        // Activity
        activity::list_activities,
        // Search
        search::search,
        // Stats
        stats::get_stats,
        analytics::get_analytics,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookStatus,
            crate::models::book::LoanedBook,
            crate::models::book::BorrowedBook,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Users
            crate::models::user::User,
            crate::models::user::UserRef,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Activity
            crate::models::activity::Activity,
            crate::models::activity::ActivityType,
            crate::models::activity::ActivityUser,
            // Stats
            crate::models::stats::DashboardStats,
            crate::models::stats::AnalyticsData,
            crate::models::stats::BorrowCount,
            crate::models::stats::StatusCount,
            crate::models::stats::DailyCount,
            // Search
            search::SearchResponse,
            // Pagination
            crate::models::pagination::Pagination,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SessionAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog, borrow and return"),
        (name = "users", description = "Borrower management"),
        (name = "circulation", description = "Borrowed and overdue books"),
        (name = "activity", description = "Activity feed"),
        (name = "search", description = "Global search"),
        (name = "stats", description = "Statistics and analytics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths
struct SessionAuth;

impl Modify for SessionAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_resource_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/books", "/books/{id}", "/users/{id}/books", "/overdue", "/analytics"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
