//! API integration tests against a running server

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Create a book with `copies` available copies, returning its ID
async fn create_book(client: &Client, copies: i32) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Pedro Páramo",
            "author": "Juan Rulfo",
            "year": 1955,
            "available_count": copies
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID")
}

/// Register a member with a unique email, returning its ID
async fn create_member(client: &Client) -> i64 {
    let stamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let response = client
        .post(format!("{}/members", BASE_URL))
        .json(&json!({
            "name": "Test Member",
            "email": format!("member-{}@example.org", stamp)
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No member ID")
}

async fn available_count(client: &Client, book_id: i64) -> i64 {
    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["available_count"].as_i64().expect("No available_count")
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
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_loan_and_return_restore_inventory() {
    let client = Client::new();
    let book_id = create_book(&client, 2).await;
    let member_id = create_member(&client).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "user_id": member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(available_count(&client, book_id).await, 1);

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    assert_eq!(available_count(&client, book_id).await, 2);

    // Returned loans can be removed
    let response = client
        .delete(format!("{}/loans/{}", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_unavailable_book_is_rejected() {
    let client = Client::new();
    let book_id = create_book(&client, 0).await;
    let member_id = create_member(&client).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "id_usuario": member_id, "id_libro": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BookNotAvailable");
    assert_eq!(available_count(&client, book_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_record_return_event() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;
    let member_id = create_member(&client).await;

    let loan: Value = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "user_id": member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .post(format!("{}/returns", BASE_URL))
        .json(&json!({
            "id_prestamo": loan["id"],
            "observaciones": "Buen estado"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let event: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(event["loan_id"], loan["id"]);
    assert_eq!(available_count(&client, book_id).await, 1);

    // A second return of the same loan is refused
    let response = client
        .post(format!("{}/returns", BASE_URL))
        .json(&json!({ "id_prestamo": loan["id"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    assert_eq!(available_count(&client, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_deleting_active_loan_conflicts() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;
    let member_id = create_member(&client).await;

    let loan: Value = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "user_id": member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .delete(format!("{}/loans/{}", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    assert_eq!(available_count(&client, book_id).await, 0);
}
