//! End-to-end booking flow.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (cargo run -p vitrinex-cli -- migrate)
//! - The server running (cargo run -p vitrinex-server)
//!
//! Run with: cargo test -p vitrinex-integration-tests -- --ignored

use chrono::{Datelike, Days, Utc, Weekday};
use reqwest::StatusCode;
use serde_json::{Value, json};

use vitrinex_integration_tests::{OwnerSession, base_url, client, expect_json};

/// A future date that is a Wednesday, far enough ahead to ignore "now".
fn next_wednesday() -> String {
    let mut date = Utc::now().date_naive() + Days::new(7);
    while date.weekday() != Weekday::Wed {
        date = date + Days::new(1);
    }
    date.to_string()
}

/// Open a bookings store with a Wednesday schedule and one 60-minute service.
async fn bookings_store() -> (OwnerSession, i64) {
    let owner = OwnerSession::open("bookings").await;

    let resp = owner
        .client
        .put(owner.url("/api/stores/mine"))
        .json(&json!({
            "slot_interval_minutes": 30,
            "weekly_schedule": {"wednesday": [{"start": "10:00", "end": "13:00"}]}
        }))
        .send()
        .await
        .expect("Failed to update store");
    expect_json(resp, StatusCode::OK).await;

    let resp = owner
        .client
        .post(owner.url("/api/services"))
        .json(&json!({"name": "Corte", "duration_minutes": 60, "price": "180.00"}))
        .send()
        .await
        .expect("Failed to create service");
    let service = expect_json(resp, StatusCode::CREATED).await;
    let service_id = service["id"].as_i64().expect("service id");

    (owner, service_id)
}

async fn slots(slug: &str, service_id: i64, date: &str) -> Vec<String> {
    let resp = client()
        .get(format!(
            "{}/api/stores/{slug}/availability?service_id={service_id}&date={date}",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to get availability");
    let body = expect_json(resp, StatusCode::OK).await;
    serde_json::from_value(body["slots"].clone()).expect("slots array")
}

fn booking_body(service_id: i64, date: &str, slot: &str) -> Value {
    json!({
        "service_id": service_id,
        "date": date,
        "slot": slot,
        "customer_name": "Luis Pérez",
        "customer_email": "luis@example.com",
        "customer_phone": "+52 55 8765 4321"
    })
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_booking_blocks_overlapping_slots() {
    let (owner, service_id) = bookings_store().await;
    let date = next_wednesday();

    let before = slots(&owner.slug, service_id, &date).await;
    assert_eq!(before, ["10:00", "10:30", "11:00", "11:30", "12:00"]);

    let resp = client()
        .post(owner.url(&format!("/api/stores/{}/bookings", owner.slug)))
        .json(&booking_body(service_id, &date, "10:30"))
        .send()
        .await
        .expect("Failed to book");
    let created = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(created["booking"]["status"], "pending");
    assert!(created["access_token"].is_string());
    assert!(created["booking"].get("access_token").is_none());

    // 10:00, 10:30 and 11:00 all overlap [10:30, 11:30).
    let after = slots(&owner.slug, service_id, &date).await;
    assert_eq!(after, ["11:30", "12:00"]);

    let resp = client()
        .post(owner.url(&format!("/api/stores/{}/bookings", owner.slug)))
        .json(&booking_body(service_id, &date, "11:00"))
        .send()
        .await
        .expect("Failed to send second booking");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_customer_cancel_frees_slot_and_is_final() {
    let (owner, service_id) = bookings_store().await;
    let date = next_wednesday();

    let resp = client()
        .post(owner.url(&format!("/api/stores/{}/bookings", owner.slug)))
        .json(&booking_body(service_id, &date, "12:00"))
        .send()
        .await
        .expect("Failed to book");
    let created = expect_json(resp, StatusCode::CREATED).await;
    let id = created["booking"]["id"].as_i64().expect("booking id");
    let token = created["access_token"].as_str().expect("token");

    let resp = client()
        .post(owner.url(&format!("/api/bookings/{id}/cancel?token={token}")))
        .send()
        .await
        .expect("Failed to cancel");
    let cancelled = expect_json(resp, StatusCode::OK).await;
    assert_eq!(cancelled["status"], "cancelled");
    assert!(slots(&owner.slug, service_id, &date).await.contains(&"12:00".to_string()));

    // Cancelled is terminal, even for the owner.
    let resp = owner
        .client
        .put(owner.url(&format!("/api/bookings/{id}/status")))
        .json(&json!({"status": "confirmed"}))
        .send()
        .await
        .expect("Failed to update status");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_validation_reports_every_field() {
    let (owner, service_id) = bookings_store().await;

    let resp = client()
        .post(owner.url(&format!("/api/stores/{}/bookings", owner.slug)))
        .json(&json!({
            "service_id": service_id,
            "date": next_wednesday(),
            "slot": "25:00",
            "customer_name": "",
            "customer_email": "nope",
        }))
        .send()
        .await
        .expect("Failed to send booking");
    let body = expect_json(resp, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["errors"].as_array().expect("errors").len(), 3);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_closed_special_day_has_no_slots() {
    let (owner, service_id) = bookings_store().await;
    let date = next_wednesday();

    let resp = owner
        .client
        .put(owner.url(&format!("/api/stores/mine/special-days/{date}")))
        .json(&json!({"closed": true, "note": "Inventario"}))
        .send()
        .await
        .expect("Failed to set special day");
    expect_json(resp, StatusCode::OK).await;

    assert!(slots(&owner.slug, service_id, &date).await.is_empty());
}
