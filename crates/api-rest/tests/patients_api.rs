//! End-to-end tests for the REST surface.
//!
//! Each test drives the full router (validation, persistence and response
//! translation) against a fresh in-memory store, without binding a socket.

use api_rest::{router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::DateTime;
use http_body_util::BodyExt;
use pacientes_core::{AppConfig, PatientRepository, RuntimeEnv};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> Router {
    let cfg = AppConfig::new(
        RuntimeEnv::Test,
        4000,
        vec!["http://localhost:4000".to_owned()],
        "./unused-by-tests.sqlite".into(),
    )
    .expect("test config");

    let repository = PatientRepository::connect_in_memory()
        .await
        .expect("open in-memory store");
    repository.ensure_schema().await.expect("create schema");

    router(AppState::new(Arc::new(cfg), repository))
}

async fn send(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse body as JSON")
    };

    (status, body)
}

fn error_messages(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .map(|e| e.as_str().expect("error string").to_owned())
        .collect()
}

#[tokio::test]
async fn full_crud_scenario() {
    let app = test_app().await;

    // Create.
    let (status, created) = send(
        &app,
        "POST",
        "/pacientes",
        Some(json!({"name": "Ana", "age": 30, "symptoms": ["fever"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["name"], "Ana");
    assert_eq!(created["age"], 30);
    assert_eq!(created["symptoms"], json!(["fever"]));

    // Read back.
    let (status, fetched) = send(&app, "GET", "/pacientes/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    // Partial update: age changes, name stays, updatedAt moves forward.
    let (status, updated) = send(&app, "PUT", "/pacientes/1", Some(json!({"age": 31}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["age"], 31);
    assert_eq!(updated["name"], "Ana");
    let created_at = DateTime::parse_from_rfc3339(updated["createdAt"].as_str().expect("createdAt"))
        .expect("parse createdAt");
    let updated_at = DateTime::parse_from_rfc3339(updated["updatedAt"].as_str().expect("updatedAt"))
        .expect("parse updatedAt");
    assert!(updated_at > created_at);

    // Delete answers 204 with an empty body.
    let (status, body) = send(&app, "DELETE", "/pacientes/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    // The record is gone.
    let (status, body) = send(&app, "GET", "/pacientes/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn create_rejects_empty_name() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/pacientes",
        Some(json!({"name": "", "age": 30, "symptoms": ["x"]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(error_messages(&body).iter().any(|m| m.contains("name")));
}

#[tokio::test]
async fn create_rejects_unknown_field() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/pacientes",
        Some(json!({"name": "Ana", "age": 30, "symptoms": [], "bloodType": "A+"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_messages(&body).iter().any(|m| m.contains("bloodType")));
}

#[tokio::test]
async fn create_reports_every_violation_at_once() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/pacientes",
        Some(json!({"name": "", "age": 121, "symptoms": "not-an-array"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages = error_messages(&body);
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().any(|m| m.contains("name")));
    assert!(messages.iter().any(|m| m.contains("age")));
    assert!(messages.iter().any(|m| m.contains("symptoms")));
}

#[tokio::test]
async fn list_is_empty_then_newest_first() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/pacientes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    for name in ["A", "B", "C"] {
        let (status, _) = send(
            &app,
            "POST",
            "/pacientes",
            Some(json!({"name": name, "age": 30, "symptoms": []})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/pacientes", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .expect("patient list")
        .iter()
        .map(|p| p["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["C", "B", "A"]);
}

#[tokio::test]
async fn malformed_id_segment_is_not_found() {
    let app = test_app().await;

    for method in ["GET", "PUT", "DELETE"] {
        let body = (method == "PUT").then(|| json!({"age": 31}));
        let (status, response) = send(&app, method, "/pacientes/abc", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} /pacientes/abc");
        assert_eq!(response["message"], "Patient not found");
    }
}

#[tokio::test]
async fn second_delete_is_not_found() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/pacientes",
        Some(json!({"name": "Ana", "age": 30, "symptoms": []})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "DELETE", "/pacientes/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", "/pacientes/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn update_rejects_invalid_fields() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/pacientes",
        Some(json!({"name": "Ana", "age": 30, "symptoms": []})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "PUT", "/pacientes/1", Some(json!({"age": 200}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_messages(&body).iter().any(|m| m.contains("age")));
}

#[tokio::test]
async fn update_missing_record_is_not_found() {
    let app = test_app().await;

    let (status, body) = send(&app, "PUT", "/pacientes/42", Some(json!({"age": 31}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Patient not found");
}

#[tokio::test]
async fn unmatched_route_reports_the_path() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/no-such-route", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Route not found: /no-such-route");
}

#[tokio::test]
async fn health_reports_store_state() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    DateTime::parse_from_rfc3339(body["timestamp"].as_str().expect("timestamp"))
        .expect("timestamp is RFC 3339");
}
