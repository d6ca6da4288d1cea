//! Integration tests for guest import, phone renormalization and health.
//!
//! Run with: cargo test --test guests_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_app, create_test_app_with, get_request, json_request, parse_response_body,
    test_config, test_config_with, test_guest,
};
use domain::models::{GuestRecord, InvitedBy, PhoneIdentity};
use domain::services::{GuestStore, InMemoryConfirmationStore, InMemoryGuestStore};
use fake::{faker::name::en::Name, Fake};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Import Tests
// ============================================================================

#[tokio::test]
async fn test_import_creates_guest_with_canonical_phone() {
    let guests = Arc::new(InMemoryGuestStore::new());
    let app = create_test_app_with(
        test_config(),
        guests.clone(),
        Arc::new(InMemoryConfirmationStore::new()),
    );

    let request = json_request(
        Method::POST,
        "/api/v1/guests/import",
        json!({
            "data": [{
                "name": "Juan Pérez",
                "phone": "55 1234-5678",
                "maxGuests": "2",
                "invitedBy": "Groom"
            }]
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["meta"]["success"], true);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["created"], 1);
    assert_eq!(body["data"]["duplicates"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 0);

    let stored = guests.list_guests().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Juan Pérez");
    assert_eq!(stored[0].phone_identity.country_code(), "521");
    assert_eq!(stored[0].phone_identity.local_number(), "5512345678");
    assert_eq!(stored[0].max_guests, 2);
    assert_eq!(stored[0].invited_by, Some(InvitedBy::Groom));
    assert_eq!(body["data"]["createdIds"][0], stored[0].id.as_str());
}

#[tokio::test]
async fn test_import_reports_duplicates_of_stored_guests() {
    let existing = test_guest("g1", "Ana López", "5512345678", Some(InvitedBy::Bride));
    let app = create_test_app_with(
        test_config(),
        Arc::new(InMemoryGuestStore::with_guests(vec![existing])),
        Arc::new(InMemoryConfirmationStore::new()),
    );

    let request = json_request(
        Method::POST,
        "/api/v1/guests/import",
        json!({
            "data": [
                { "name": "Ana L.", "phone": "+52 1 55 1234 5678" },
                { "name": "Carlos Ruiz", "phone": "33 9876 5432" }
            ]
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["created"], 1);

    let duplicates = body["data"]["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0]["row"], 1);
    assert_eq!(duplicates[0]["existing"]["id"], "g1");
    assert_eq!(duplicates[0]["existing"]["name"], "Ana López");
}

#[tokio::test]
async fn test_import_deduplicates_within_batch() {
    let app = create_test_app(test_config());
    let first: String = Name().fake();
    let second: String = Name().fake();

    let request = json_request(
        Method::POST,
        "/api/v1/guests/import",
        json!({
            "data": [
                { "name": first, "phone": "5512345678" },
                { "name": second, "phone": "52 55 1234 5678" }
            ]
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    let body = parse_response_body(response).await;

    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["created"], 1);
    assert_eq!(body["data"]["duplicates"][0]["row"], 2);
    assert_eq!(body["data"]["duplicates"][0]["existing"]["name"], first.as_str());
}

#[tokio::test]
async fn test_import_keeps_going_after_row_errors() {
    let guests = Arc::new(InMemoryGuestStore::new().failing_for(["Broken Guest"]));
    let app = create_test_app_with(
        test_config(),
        guests.clone(),
        Arc::new(InMemoryConfirmationStore::new()),
    );

    let request = json_request(
        Method::POST,
        "/api/v1/guests/import",
        json!({
            "data": [
                { "phone": "5511111111" },
                { "name": "Broken Guest", "phone": "5522222222" },
                { "name": "Good Guest", "phone": "5533333333" }
            ]
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["created"], 1);

    let errors = body["data"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["row"], 1);
    assert_eq!(errors[0]["kind"], "validation");
    assert_eq!(errors[1]["row"], 2);
    assert_eq!(errors[1]["kind"], "dependency");

    assert_eq!(guests.list_guests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_empty_batch() {
    let app = create_test_app(test_config());
    let request = json_request(Method::POST, "/api/v1/guests/import", json!({ "data": [] }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["created"], 0);
}

#[tokio::test]
async fn test_import_rejects_oversized_batch() {
    let guests = Arc::new(InMemoryGuestStore::new());
    let app = create_test_app_with(
        test_config_with(&[("limits.max_import_rows", "2")]),
        guests.clone(),
        Arc::new(InMemoryConfirmationStore::new()),
    );

    let rows: Vec<_> = (0..3)
        .map(|i| json!({ "name": format!("Guest {}", i), "phone": format!("551234567{}", i) }))
        .collect();
    let request = json_request(Method::POST, "/api/v1/guests/import", json!({ "data": rows }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("limit is 2"));
    assert!(guests.list_guests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_fails_when_store_unavailable() {
    let app = create_test_app_with(
        test_config(),
        Arc::new(InMemoryGuestStore::unavailable()),
        Arc::new(InMemoryConfirmationStore::new()),
    );

    let request = json_request(
        Method::POST,
        "/api/v1/guests/import",
        json!({ "data": [{ "name": "Ana", "phone": "5512345678" }] }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Renormalization Tests
// ============================================================================

fn legacy_guest(id: &str, country_code: &str, local_number: &str) -> GuestRecord {
    GuestRecord {
        phone_identity: PhoneIdentity::from_parts(country_code, local_number).unwrap(),
        ..test_guest(id, "Legacy Guest", "5500000000", None)
    }
}

#[tokio::test]
async fn test_renormalize_rewrites_legacy_phones() {
    let guests = Arc::new(InMemoryGuestStore::new());
    guests
        .insert_with_raw_phone(
            legacy_guest("g1", "52", "5512345678"),
            Some("+52 55 1234 5678".to_string()),
        )
        .unwrap();
    guests
        .insert_with_raw_phone(legacy_guest("g2", "521", "5598765432"), None)
        .unwrap();
    guests
        .insert_with_raw_phone(legacy_guest("g3", "521", ""), None)
        .unwrap();

    let app = create_test_app_with(
        test_config(),
        guests.clone(),
        Arc::new(InMemoryConfirmationStore::new()),
    );

    let request = json_request(Method::POST, "/api/v1/guests/phones/renormalize", json!({}));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["updated"], 1);
    assert_eq!(body["data"]["skipped"], 2);
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 0);

    let g1 = guests.find_guest("g1").await.unwrap().unwrap();
    assert_eq!(g1.phone_identity.country_code(), "521");
    assert_eq!(g1.phone_identity.local_number(), "5512345678");
}

// ============================================================================
// Health Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_ok() {
    let app = create_test_app(test_config());

    let response = app.oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["connected"], true);
}

#[tokio::test]
async fn test_health_check_store_down() {
    let app = create_test_app_with(
        test_config(),
        Arc::new(InMemoryGuestStore::unavailable()),
        Arc::new(InMemoryConfirmationStore::new()),
    );

    let response = app.oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_request_id_header_is_echoed() {
    let app = create_test_app(test_config());
    let request = axum::http::Request::builder()
        .uri("/api/health")
        .header("X-Request-ID", "import-42")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "import-42");
}
