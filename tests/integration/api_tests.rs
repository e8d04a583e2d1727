//! API integration tests
//!
//! Require a running server and database. Sessions are minted locally with
//! the same secret the server verifies (`SESSION_SECRET`).

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use shelfkeeper_server::models::user::SessionClaims;

const BASE_URL: &str = "http://localhost:8080/api";

fn session_token(user_id: Uuid) -> String {
    let secret = std::env::var("SESSION_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = Utc::now().timestamp();
    SessionClaims {
        sub: user_id,
        email: None,
        name: Some("Integration".into()),
        exp: now + 600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign session token")
}

/// Register a throwaway user and return its ID
async fn create_user(client: &Client, token: &str) -> Uuid {
    let email = format!("it-{}@example.org", Uuid::new_v4().simple());
    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": "Integration Reader", "email": email }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_str().expect("No user ID").parse().expect("Invalid user ID")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let response = Client::new()
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let response = Client::new()
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books_pagination() {
    let client = Client::new();
    let token = session_token(Uuid::new_v4());

    let response = client
        .get(format!("{}/books?page=0&limit=5", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 5);
    assert!(body["pagination"]["totalPages"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_cycle() {
    let client = Client::new();
    let admin = session_token(Uuid::new_v4());
    let reader_id = create_user(&client, &admin).await;
    let token = session_token(reader_id);

    // Add a book as the reader
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "category": "Testing",
            "rating": 7.5
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let book: Value = response.json().await.expect("Failed to parse response");
    let book_id = book["id"].as_str().expect("No book ID").to_string();
    assert_eq!(book["status"], "Available");
    assert_eq!(book["rating"], 5.0);

    // Borrow it
    let due = Utc::now() + Duration::days(14);
    let response = client
        .put(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "id": book_id,
            "status": "Borrowed",
            "borrowedBy": reader_id,
            "dueDate": due
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let borrowed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(borrowed["status"], "Borrowed");
    assert_eq!(borrowed["borrowedBy"], reader_id.to_string());

    // The user's loans list it, and neither side can be deleted
    let response = client
        .get(format!("{}/users/{}/books", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let loans: Value = response.json().await.expect("Failed to parse response");
    assert!(loans["data"]
        .as_array()
        .expect("No loans")
        .iter()
        .any(|b| b["id"] == book_id.as_str() && b["isOverdue"] == false));

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .delete(format!("{}/users?id={}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Cannot delete user with borrowed books");

    // Return it
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "Available" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert!(returned["borrowedBy"].is_null());
    assert!(returned["dueDate"].is_null());

    // The feed records the return
    let response = client
        .get(format!("{}/activity?limit=20", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let feed: Value = response.json().await.expect("Failed to parse response");
    assert!(feed["data"]
        .as_array()
        .expect("No activity")
        .iter()
        .any(|a| a["type"] == "return" && a["item"] == "Integration Test Book"));

    // Cleanup
    let response = client
        .delete(format!("{}/books?id={}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, reader_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_create_book_with_session_user_unknown_to_catalog() {
    let client = Client::new();
    let token = session_token(Uuid::new_v4());

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "title": "Dune", "author": "Herbert", "category": "SF" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let book: Value = response.json().await.expect("Failed to parse response");

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book["id"].as_str().expect("No book ID")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_concurrent_reassignment_has_one_winner() {
    let client = Client::new();
    let token = session_token(Uuid::new_v4());
    let first = create_user(&client, &token).await;
    let second = create_user(&client, &token).await;
    let third = create_user(&client, &token).await;
    let title = format!("Contested {}", Uuid::new_v4().simple());

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "title": title, "author": "Test Author", "category": "Testing" }))
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    let book_id = book["id"].as_str().expect("No book ID").to_string();

    let due = Utc::now() + Duration::days(14);
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "Borrowed", "borrowedBy": first, "dueDate": due }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let reassign = |borrower: Uuid| {
        client
            .put(format!("{}/books/{}", BASE_URL, book_id))
            .bearer_auth(&token)
            .json(&json!({ "borrowedBy": borrower }))
            .send()
    };
    let (a, b) = tokio::join!(reassign(second), reassign(third));
    let statuses = [
        a.expect("Failed to send request").status(),
        b.expect("Failed to send request").status(),
    ];
    let winners = statuses.iter().filter(|s| s.is_success()).count();
    assert!(winners >= 1);
    assert!(statuses.iter().all(|s| s.is_success() || s.as_u16() == 409));

    // Each accepted hand-over logs exactly one return
    let response = client
        .get(format!("{}/activity?limit=100", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let feed: Value = response.json().await.expect("Failed to parse response");
    let returns = feed["data"]
        .as_array()
        .expect("No activity")
        .iter()
        .filter(|a| a["type"] == "return" && a["item"] == title.as_str())
        .count();
    assert_eq!(returns, winners);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "Available" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await;
    for user in [first, second, third] {
        let _ = client
            .delete(format!("{}/users/{}", BASE_URL, user))
            .bearer_auth(&token)
            .send()
            .await;
    }
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_rejected() {
    let client = Client::new();
    let token = session_token(Uuid::new_v4());
    let email = format!("dup-{}@example.org", Uuid::new_v4().simple());

    let first = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "First", "email": email }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 201);
    let user: Value = first.json().await.expect("Failed to parse response");

    let second = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Second", "email": email.to_uppercase() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 400);
    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Email already registered");

    let _ = client
        .delete(format!("{}/users/{}", BASE_URL, user["id"].as_str().unwrap_or_default()))
        .bearer_auth(&token)
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = session_token(Uuid::new_v4());

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["totalBooks"].is_number());
    assert!(body["totalUsers"].is_number());
    assert!(body["borrowedBooks"].is_number());
    assert!(body["overdueBooks"].is_number());
    assert!(body["recentBooks"].as_array().map(|b| b.len() <= 5).unwrap_or(false));
}

#[tokio::test]
#[ignore]
async fn test_analytics_series() {
    let client = Client::new();
    let token = session_token(Uuid::new_v4());

    for kind in ["most-borrowed-books", "book-status-distribution", "activity-over-time"] {
        let response = client
            .get(format!("{}/analytics?type={}", BASE_URL, kind))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success(), "{kind}");
        let body: Value = response.json().await.expect("Failed to parse response");
        assert!(body.is_array(), "{kind}");
    }
}

#[tokio::test]
#[ignore]
async fn test_search() {
    let client = Client::new();
    let token = session_token(Uuid::new_v4());

    let response = client
        .get(format!("{}/search?query=a", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["books"].as_array().map(|b| b.len() <= 10).unwrap_or(false));
    assert!(body["users"].as_array().map(|u| u.len() <= 10).unwrap_or(false));
}
