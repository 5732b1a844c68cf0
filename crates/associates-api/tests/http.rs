//! HTTP tests driving the router in-process

use associates_api::{create_router, AppState};
use associates_core::{CoreConfig, InMemoryRecordStore, RecordStore};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    create_router(AppState::new(store, CoreConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/admin/associates",
        Some(json!({"name": "Ana", "email": email, "cpf": "12345678901"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("error").is_none());
    let id = body["data"]["record"]["id"].as_str().unwrap().to_string();
    let token = body["data"]["token"]["value"].as_str().unwrap().to_string();
    (id, token)
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_field_page_workflow() {
    let app = app();
    let (_, token) = create(&app, "a@b.com").await;

    let (status, body) = send(&app, Method::GET, &format!("/associate/field/{token}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], "field");
    assert_eq!(body["data"]["associate"]["status"], "pending");
    assert!(body["data"]["associate"].get("token").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/associate/field/{token}"),
        Some(json!({"email": "bad", "phone": "11987654321"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(body["error"]["reasons"], json!(["invalid_email"]));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/associate/field/{token}"),
        Some(json!({"email": "a@b.com", "phone": "11987654321", "postal_code": "01310100"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["associate"]["status"], "active");
    assert_eq!(body["data"]["associate"]["phone"], "(11) 98765-4321");
    assert_eq!(body["data"]["associate"]["postal_code"], "01310-100");

    let (status, body) = send(&app, Method::GET, &format!("/associate/form/{token}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_form_page_lists_every_failure() {
    let app = app();
    let (_, token) = create(&app, "a@b.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/associate/form/{token}"),
        Some(json!({"email": "a@", "cpf": "1", "phone": "2", "postal_code": "3"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"]["reasons"],
        json!([
            "invalid_email",
            "invalid_cpf_length",
            "invalid_phone_length",
            "invalid_postal_length"
        ])
    );
}

#[tokio::test]
async fn test_unknown_token() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/associate/form/does-not-exist",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_admin_create_rejects_duplicate_email() {
    let app = app();
    create(&app, "a@b.com").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/admin/associates",
        Some(json!({"name": "Other", "email": "a@b.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["reasons"], json!(["email_in_use"]));
}

#[tokio::test]
async fn test_admin_reject_and_list() {
    let app = app();
    let (id, token) = create(&app, "a@b.com").await;
    create(&app, "c@d.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/admin/associates/{id}/reject"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/admin/associates/{id}/reject"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::GET, &format!("/associate/field/{token}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/admin/associates?status=pending", None).await;
    assert_eq!(status, StatusCode::OK);
    let pending = body["data"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["email"], "c@d.com");
}

#[tokio::test]
async fn test_admin_reissue_token() {
    let app = app();
    let (id, old_token) = create(&app, "a@b.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/admin/associates/{id}/token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_token = body["data"]["value"].as_str().unwrap().to_string();
    assert_ne!(new_token, old_token);

    let (status, _) = send(&app, Method::GET, &format!("/associate/form/{old_token}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &format!("/associate/form/{new_token}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_bad_associate_id() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/admin/associates/nope/reject", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/admin/associates/{}/token", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
