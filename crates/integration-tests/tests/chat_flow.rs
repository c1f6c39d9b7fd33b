//! End-to-end chat: token access and unread counters.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (cargo run -p vitrinex-cli -- migrate)
//! - The server running (cargo run -p vitrinex-server)
//!
//! Run with: cargo test -p vitrinex-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::json;

use vitrinex_integration_tests::{OwnerSession, client, expect_json};

/// Place an order and return its ID and customer token.
async fn order(owner: &OwnerSession) -> (i64, String) {
    let resp = owner
        .client
        .post(owner.url("/api/products"))
        .json(&json!({"name": "Vela de soya", "price": "120.00"}))
        .send()
        .await
        .expect("Failed to create product");
    let product = expect_json(resp, StatusCode::CREATED).await;

    let resp = client()
        .post(owner.url(&format!("/api/stores/{}/orders", owner.slug)))
        .json(&json!({
            "items": [{"product_id": product["id"], "quantity": 1}],
            "customer_name": "Sofía",
            "customer_email": "sofia@example.com"
        }))
        .send()
        .await
        .expect("Failed to place order");
    let created = expect_json(resp, StatusCode::CREATED).await;
    (
        created["order"]["id"].as_i64().expect("order id"),
        created["access_token"].as_str().expect("token").to_string(),
    )
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unread_counters_follow_messages() {
    let owner = OwnerSession::open("products").await;
    let (id, token) = order(&owner).await;
    let customer = client();

    for text in ["Hola, ¿envían a Puebla?", "¿Y cuánto tarda?"] {
        let resp = customer
            .post(owner.url(&format!("/api/messages/order/{id}?token={token}")))
            .json(&json!({ "content": text }))
            .send()
            .await
            .expect("Failed to post");
        let message = expect_json(resp, StatusCode::CREATED).await;
        assert_eq!(message["sender_type"], "customer");
    }

    let resp = owner
        .client
        .get(owner.url("/api/messages/unread"))
        .send()
        .await
        .expect("Failed to get unread");
    let unread = expect_json(resp, StatusCode::OK).await;
    assert_eq!(unread["total"], 2);

    let resp = owner
        .client
        .post(owner.url(&format!("/api/messages/order/{id}")))
        .json(&json!({"content": "¡Sí! Llega en 3 días."}))
        .send()
        .await
        .expect("Failed to reply");
    let reply = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(reply["sender_type"], "owner");

    let resp = owner
        .client
        .post(owner.url(&format!("/api/messages/order/{id}/read")))
        .send()
        .await
        .expect("Failed to mark read");
    let marked = expect_json(resp, StatusCode::OK).await;
    assert_eq!(marked["marked"], 2);

    let resp = owner
        .client
        .get(owner.url(&format!("/api/orders/{id}")))
        .send()
        .await
        .expect("Failed to get order");
    let order = expect_json(resp, StatusCode::OK).await;
    assert_eq!(order["unread_for_owner"], 0);
    assert_eq!(order["unread_for_customer"], 1);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_wrong_token_cannot_read_thread() {
    let owner = OwnerSession::open("products").await;
    let (id, _token) = order(&owner).await;

    let resp = client()
        .get(owner.url(&format!(
            "/api/messages/order/{id}?token=00000000-0000-4000-8000-000000000000"
        )))
        .send()
        .await
        .expect("Failed to get thread");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Another owner's session does not reach this thread either.
    let stranger = OwnerSession::open("products").await;
    let resp = stranger
        .client
        .get(stranger.url(&format!("/api/messages/order/{id}")))
        .send()
        .await
        .expect("Failed to get thread");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
