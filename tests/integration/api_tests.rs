//! API integration tests
//!
//! These run against a live server with a clean database:
//! cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Unique suffix so repeated runs do not collide on unique columns
fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

/// Create a user and return (user_id, email)
async fn signup(client: &Client, tag: &str) -> (i64, String) {
    let email = format!("{}{}@example.com", tag, unique_suffix());
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": email,
            "username": tag,
            "password": "securepassword"
        }))
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse signup response");
    (body["id"].as_i64().expect("No user ID"), email)
}

/// Log in and return the bearer token
async fn login(client: &Client, email: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "securepassword"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Create a book and return its id
async fn create_book(client: &Client, token: &str, title: &str) -> i64 {
    let isbn = format!("{:013}", unique_suffix() % 10_000_000_000_000);
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "author": "Test Author",
            "isbn": isbn
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse book response");
    assert_eq!(body["status"], "available");
    assert!(body["borrower_id"].is_null());
    body["id"].as_i64().expect("No book ID")
}

#[tokio::test]
#[ignore]
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
async fn test_signup_and_login() {
    let client = Client::new();
    let (_user_id, email) = signup(&client, "logintest").await;

    let token = login(&client, &email).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], email.as_str());
    // Password hash must never be serialized
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (_user_id, email) = signup(&client, "badlogin").await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "wrongpassword"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_signup() {
    let client = Client::new();
    let (_user_id, email) = signup(&client, "duplicate").await;

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": email,
            "username": "duplicate",
            "password": "securepassword"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_round_trip() {
    let client = Client::new();
    let (user_id, email) = signup(&client, "borrower").await;
    let token = login(&client, &email).await;
    let book_id = create_book(&client, &token, "Round Trip").await;

    // Borrow
    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "borrowed");
    assert_eq!(body["borrower_id"].as_i64(), Some(user_id));
    assert!(body["due_date"].is_string());

    // Return restores the available state with no borrower
    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");
    assert!(body["borrower_id"].is_null());
    assert!(body["due_date"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_double_borrow_conflicts() {
    let client = Client::new();
    let (_user_id, email) = signup(&client, "doubleborrow").await;
    let token = login(&client, &email).await;
    let book_id = create_book(&client, &token, "Double Borrow").await;

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert!(response.status().is_success());

    // Second borrow without an intervening return must conflict
    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_return_available_book_conflicts() {
    let client = Client::new();
    let (_user_id, email) = signup(&client, "earlyreturn").await;
    let token = login(&client, &email).await;
    let book_id = create_book(&client, &token, "Never Borrowed").await;

    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_borrow_missing_book() {
    let client = Client::new();
    let (_user_id, email) = signup(&client, "missingbook").await;
    let token = login(&client, &email).await;

    let response = client
        .post(format!("{}/books/999999999/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_return_by_non_borrower_forbidden() {
    let client = Client::new();
    let (_alice_id, alice_email) = signup(&client, "alice").await;
    let (_bob_id, bob_email) = signup(&client, "bob").await;
    let alice_token = login(&client, &alice_email).await;
    let bob_token = login(&client, &bob_email).await;
    let book_id = create_book(&client, &alice_token, "Alice's Loan").await;

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", alice_token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert!(response.status().is_success());

    // Bob is authenticated but not the borrower
    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", bob_token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_delete_borrowed_book_conflicts() {
    let client = Client::new();
    let (_user_id, email) = signup(&client, "deleter").await;
    let token = login(&client, &email).await;
    let book_id = create_book(&client, &token, "Held Book").await;

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 409);

    // After return, deletion goes through
    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_borrowed_books_listing() {
    let client = Client::new();
    let (user_id, email) = signup(&client, "lister").await;
    let token = login(&client, &email).await;
    let book_id = create_book(&client, &token, "Listed Loan").await;

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/books/borrowed", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let borrowed = body.as_array().expect("Expected an array");
    let entry = borrowed
        .iter()
        .find(|b| b["id"].as_i64() == Some(book_id))
        .expect("Borrowed book missing from listing");
    assert_eq!(entry["borrower_id"].as_i64(), Some(user_id));
}

#[tokio::test]
#[ignore]
async fn test_delete_user_with_borrowed_book_conflicts() {
    let client = Client::new();
    let (user_id, email) = signup(&client, "holder").await;
    let token = login(&client, &email).await;
    let book_id = create_book(&client, &token, "Still Out").await;

    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 409);
}

/// Full lifecycle scenario: add, borrow, conflicting borrow, return, double return
#[tokio::test]
#[ignore]
async fn test_book_lifecycle_scenario() {
    let client = Client::new();
    let (frank_id, frank_email) = signup(&client, "frank").await;
    let (_paul_id, paul_email) = signup(&client, "paul").await;
    let frank_token = login(&client, &frank_email).await;
    let paul_token = login(&client, &paul_email).await;

    let book_id = create_book(&client, &frank_token, "Dune").await;

    // Frank borrows Dune
    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", frank_token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "borrowed");
    assert_eq!(body["borrower_id"].as_i64(), Some(frank_id));

    // Paul cannot borrow it
    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", paul_token))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 409);

    // Frank returns it
    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", frank_token))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");
    assert!(body["borrower_id"].is_null());

    // A second return conflicts
    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", frank_token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 409);
}
