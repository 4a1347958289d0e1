//! API integration tests
//!
//! These tests exercise a running server (`cargo run`) with a seeded
//! librarian account (admin/admin). Everything else they need is created
//! through the API itself. Run with: cargo test -- --ignored

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Log in and return a bearer token
async fn get_token(client: &Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": login,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Log in as the seeded librarian
async fn get_librarian_token(client: &Client) -> String {
    get_token(client, "admin", "admin").await
}

/// Create a reader account and return (id, token)
async fn create_reader(client: &Client, librarian_token: &str, login: &str) -> (i64, String) {
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", librarian_token))
        .json(&json!({
            "login": login,
            "password": "12345",
            "account_type": "reader"
        }))
        .send()
        .await
        .expect("Failed to create reader");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse user response");
    let id = body["id"].as_i64().expect("No user ID");
    let token = get_token(client, login, "12345").await;
    (id, token)
}

/// Create an author and return its id
async fn create_author(client: &Client, token: &str, first_name: &str, last_name: &str) -> i64 {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "first_name": first_name,
            "last_name": last_name
        }))
        .send()
        .await
        .expect("Failed to create author");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse author response");
    body["id"].as_i64().expect("No author ID")
}

/// Create a book and return its id
async fn create_book(client: &Client, token: &str, title: &str, author_id: Option<i64>) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "summary": "A book summary",
            "isbn": "9780000000001",
            "author_id": author_id
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_i64().expect("No book ID")
}

/// Create an available copy of a book and return its UUID
async fn create_available_instance(client: &Client, token: &str, book_id: i64) -> String {
    let response = client
        .post(format!("{}/books/{}/instances", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "imprint": "Unlikely Imprint, 2016",
            "status": "available"
        }))
        .send()
        .await
        .expect("Failed to create instance");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse instance response");
    body["id"].as_str().expect("No instance ID").to_string()
}

/// Check a copy out to a borrower
async fn checkout(client: &Client, token: &str, instance_id: &str, borrower_id: i64, days_out: i64) {
    let due_back = (Utc::now().date_naive() + Duration::days(days_out)).to_string();
    let response = client
        .post(format!("{}/instances/{}/checkout", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "borrower_id": borrower_id,
            "due_back": due_back
        }))
        .send()
        .await
        .expect("Failed to checkout");
    assert_eq!(response.status(), 200);
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
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["can_mark_returned"], true);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_book_list_requires_authentication() {
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
async fn test_author_list_is_public() {
    let client = Client::new();

    // Unlike books, the author list needs no token
    let response = client
        .get(format!("{}/authors", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert_eq!(body["per_page"], 10);
}

#[tokio::test]
#[ignore]
async fn test_author_pagination_is_ten() {
    let client = Client::new();
    let token = get_librarian_token(&client).await;

    // 13 authors are enough to guarantee a full first page
    for n in 0..13 {
        create_author(&client, &token, &format!("Christian {}", n), &format!("Surname {}", n)).await;
    }

    let response = client
        .get(format!("{}/authors?page=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert!(body["total"].as_i64().unwrap() >= 13);
}

#[tokio::test]
#[ignore]
async fn test_renewal_date_window() {
    let client = Client::new();
    let token = get_librarian_token(&client).await;

    let author_id = create_author(&client, &token, "John", "Smith").await;
    let book_id = create_book(&client, &token, "Book Title", Some(author_id)).await;
    let instance_id = create_available_instance(&client, &token, book_id).await;
    let (borrower_id, _) = create_reader(&client, &token, &format!("renewer-{}", book_id)).await;
    checkout(&client, &token, &instance_id, borrower_id, 7).await;

    let today = Utc::now().date_naive();

    // Rule 1: no backdating
    let response = client
        .post(format!("{}/instances/{}/renew", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "renewal_date": (today - Duration::days(1)).to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("past"));

    // Rule 2: at most four weeks out
    let response = client
        .post(format!("{}/instances/{}/renew", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "renewal_date": (today + Duration::days(31)).to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("4 weeks"));

    // Two weeks out is accepted and applied unchanged, status stays on loan
    let accepted = (today + Duration::days(14)).to_string();
    let response = client
        .post(format!("{}/instances/{}/renew", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "renewal_date": accepted }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["due_back"].as_str().unwrap(), accepted);
    assert_eq!(body["status"], "onloan");
}

#[tokio::test]
#[ignore]
async fn test_renewal_proposal_defaults_to_three_weeks() {
    let client = Client::new();
    let token = get_librarian_token(&client).await;

    let book_id = create_book(&client, &token, "Proposal Book", None).await;
    let instance_id = create_available_instance(&client, &token, book_id).await;

    let response = client
        .get(format!("{}/instances/{}/renew", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let expected = (Utc::now().date_naive() + Duration::weeks(3)).to_string();
    assert_eq!(body["proposed_renewal_date"].as_str().unwrap(), expected);
}

#[tokio::test]
#[ignore]
async fn test_borrowed_books_are_scoped_to_the_caller() {
    let client = Client::new();
    let token = get_librarian_token(&client).await;

    let book_id = create_book(&client, &token, "Shared Book", None).await;
    let (user1, token1) = create_reader(&client, &token, &format!("borrower1-{}", book_id)).await;
    let (user2, _) = create_reader(&client, &token, &format!("borrower2-{}", book_id)).await;

    // 30 copies, alternating borrowers, staggered due dates
    for n in 0..30 {
        let instance_id = create_available_instance(&client, &token, book_id).await;
        let borrower = if n % 2 == 0 { user1 } else { user2 };
        checkout(&client, &token, &instance_id, borrower, n % 5 + 1).await;
    }

    let response = client
        .get(format!("{}/loans/mine", BASE_URL))
        .header("Authorization", format!("Bearer {}", token1))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let items = body["items"].as_array().unwrap();

    // Page size ten, only the caller's copies, ordered by ascending due-back
    assert_eq!(items.len(), 10);
    assert_eq!(body["total"].as_i64().unwrap(), 15);
    let mut previous: Option<String> = None;
    for item in items {
        assert_eq!(item["borrower"]["id"].as_i64().unwrap(), user1);
        assert_eq!(item["status"], "onloan");
        let due_back = item["due_back"].as_str().unwrap().to_string();
        if let Some(prev) = previous {
            assert!(prev <= due_back);
        }
        previous = Some(due_back);
    }

    // A reader may not list someone else's loans
    let response = client
        .get(format!("{}/users/{}/loans", BASE_URL, user2))
        .header("Authorization", format!("Bearer {}", token1))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_author_deletion_requires_capability_and_clears_books() {
    let client = Client::new();
    let token = get_librarian_token(&client).await;

    let author_id = create_author(&client, &token, "Ephemeral", "Author").await;
    let book_id = create_book(&client, &token, "Orphaned Book", Some(author_id)).await;
    let (_, reader_token) = create_reader(&client, &token, &format!("reader-{}", book_id)).await;

    // A reader lacks the capability
    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .header("Authorization", format!("Bearer {}", reader_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // The librarian succeeds
    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // The book survives with its author reference cleared
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["author_id"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_return_makes_copy_available_again() {
    let client = Client::new();
    let token = get_librarian_token(&client).await;

    let book_id = create_book(&client, &token, "Returnable Book", None).await;
    let instance_id = create_available_instance(&client, &token, book_id).await;
    let (borrower_id, _) = create_reader(&client, &token, &format!("returner-{}", book_id)).await;
    checkout(&client, &token, &instance_id, borrower_id, 7).await;

    let response = client
        .post(format!("{}/instances/{}/return", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");
    assert!(body["borrower_id"].is_null());
    assert!(body["due_back"].is_null());

    // Returning twice is rejected
    let response = client
        .post(format!("{}/instances/{}/return", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_dashboard_counts_and_session_visits() {
    let client = Client::new();

    let response = client
        .get(format!("{}/dashboard", BASE_URL))
        .header("x-session-id", "test-session")
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["num_books"].is_number());
    assert!(body["num_instances"].is_number());
    assert!(body["num_instances_available"].is_number());
    assert!(body["num_authors"].is_number());
    assert!(body["num_genres"].is_number());
    assert!(body["num_books_with_y"].is_number());
    let first_visits = body["num_visits"].as_i64().unwrap();

    // The same session's counter advances by one on the next render
    let response = client
        .get(format!("{}/dashboard", BASE_URL))
        .header("x-session-id", "test-session")
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["num_visits"].as_i64().unwrap(), first_visits + 1);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_language_is_rejected() {
    let client = Client::new();
    let token = get_librarian_token(&client).await;

    let name = format!("Esperanto-{}", Utc::now().timestamp_millis());

    let response = client
        .post(format!("{}/languages", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/languages", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}
