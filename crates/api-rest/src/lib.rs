//! # API REST
//!
//! REST API implementation for the pacientes record service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Translation of validator/repository outcomes into status codes
//! - The uniform error response shape
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, request tracing)
//!
//! Uses `pacientes-core` for validation, persistence and configuration.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use pacientes_core::{
    AppConfig, Patient, PatientError, PatientRepository, Violation, validate_new_patient,
    validate_patient_patch,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers:
/// the startup-resolved configuration and the patient repository.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<AppConfig>,
    repository: PatientRepository,
}

impl AppState {
    pub fn new(cfg: Arc<AppConfig>, repository: PatientRepository) -> Self {
        Self { cfg, repository }
    }
}

/// Uniform error response body.
///
/// Every handler-level failure funnels into this one shape; `errors` is only
/// present for validation rejections.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_owned(),
            message: message.into(),
            errors: None,
        }
    }

    fn with_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(message)
        }
    }
}

type ErrorResponse = (StatusCode, Json<ErrorBody>);

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    /// Always `"ok"` — the process is up if it can answer at all.
    pub status: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    /// Store reachability: `"connected"` or `"disconnected"`.
    pub database: String,
}

/// Patient payload as documented to API consumers.
///
/// Handlers deliberately do not deserialise into this type — they pass the
/// raw JSON object to the validator so unknown fields can be rejected rather
/// than silently dropped. This struct exists for the OpenAPI document.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PatientBody {
    /// Display name, non-empty, at most 100 characters.
    pub name: String,
    /// Age in whole years, 0 to 120 inclusive.
    pub age: i64,
    /// Reported symptoms, each a non-empty string.
    pub symptoms: Vec<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_pacientes,
        create_paciente,
        get_paciente,
        update_paciente,
        delete_paciente,
    ),
    components(schemas(Patient, PatientBody, HealthRes, ErrorBody))
)]
pub struct ApiDoc;

/// Builds the application router with all routes, documentation and layers.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.cfg.allowed_origins());

    Router::new()
        .route("/health", get(health))
        .route("/pacientes", get(list_pacientes))
        .route("/pacientes", post(create_paciente))
        .route("/pacientes/:id", get(get_paciente))
        .route("/pacientes/:id", put(update_paciente))
        .route("/pacientes/:id", delete(delete_paciente))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
///
/// Reports the service status, the current time and whether the patient
/// store answers queries. Used for monitoring and load balancer checks.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    let database = if state.repository.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthRes {
        status: "ok".to_owned(),
        timestamp: Utc::now().to_rfc3339(),
        database: database.to_owned(),
    })
}

#[utoipa::path(
    get,
    path = "/pacientes",
    responses(
        (status = 200, description = "List of patients, most recently created first", body = [Patient]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// List all patients
///
/// No input validation; an empty store yields an empty list, not an error.
///
/// # Errors
/// Returns `500 Internal Server Error` if the store cannot be queried.
#[axum::debug_handler]
pub async fn list_pacientes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Patient>>, ErrorResponse> {
    match state.repository.find_all().await {
        Ok(pacientes) => Ok(Json(pacientes)),
        Err(e) => Err(storage_failed(&state, "list patients", &e)),
    }
}

#[utoipa::path(
    post,
    path = "/pacientes",
    request_body = PatientBody,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Validation rejected the payload", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Create a new patient
///
/// Runs the validator over the raw payload first; every violation is
/// reported at once. On success the stored record, with its assigned id and
/// timestamps, is returned.
///
/// # Errors
/// Returns `400 Bad Request` with the violation list when validation fails,
/// or `500 Internal Server Error` when the store write fails.
#[axum::debug_handler]
pub async fn create_paciente(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Patient>), ErrorResponse> {
    let Some(raw) = body.as_object() else {
        return Err(not_an_object());
    };
    let new = validate_new_patient(raw).map_err(validation_rejected)?;

    match state.repository.create(&new).await {
        Ok(paciente) => Ok((StatusCode::CREATED, Json(paciente))),
        Err(e) => Err(storage_failed(&state, "create patient", &e)),
    }
}

#[utoipa::path(
    get,
    path = "/pacientes/{id}",
    params(("id" = i64, Path, description = "Store-assigned patient id")),
    responses(
        (status = 200, description = "The patient record", body = Patient),
        (status = 404, description = "No patient with that id", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Read one patient by id
///
/// # Errors
/// Returns `404 Not Found` when the id does not match a record (a
/// non-integer id segment can never match and collapses into the same
/// response), or `500 Internal Server Error` when the store fails.
#[axum::debug_handler]
pub async fn get_paciente(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Patient>, ErrorResponse> {
    let Some(id) = parse_id(&id) else {
        return Err(patient_not_found());
    };

    match state.repository.find_by_id(id).await {
        Ok(Some(paciente)) => Ok(Json(paciente)),
        Ok(None) => Err(patient_not_found()),
        Err(e) => Err(storage_failed(&state, "read patient", &e)),
    }
}

#[utoipa::path(
    put,
    path = "/pacientes/{id}",
    params(("id" = i64, Path, description = "Store-assigned patient id")),
    request_body = PatientBody,
    responses(
        (status = 200, description = "The updated patient record", body = Patient),
        (status = 400, description = "Validation rejected the payload", body = ErrorBody),
        (status = 404, description = "No patient with that id", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Update a patient
///
/// The payload may be partial: only the fields present are validated (with
/// the same per-field rules as create) and replaced; omitted fields keep
/// their stored values. `updatedAt` is refreshed on success.
///
/// # Errors
/// Returns `400 Bad Request` on validation failure, `404 Not Found` when the
/// id does not match a record, or `500 Internal Server Error` when the store
/// fails.
#[axum::debug_handler]
pub async fn update_paciente(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Patient>, ErrorResponse> {
    let Some(id) = parse_id(&id) else {
        return Err(patient_not_found());
    };
    let Some(raw) = body.as_object() else {
        return Err(not_an_object());
    };
    let patch = validate_patient_patch(raw).map_err(validation_rejected)?;

    match state.repository.update(id, &patch).await {
        Ok(Some(paciente)) => Ok(Json(paciente)),
        Ok(None) => Err(patient_not_found()),
        Err(e) => Err(storage_failed(&state, "update patient", &e)),
    }
}

#[utoipa::path(
    delete,
    path = "/pacientes/{id}",
    params(("id" = i64, Path, description = "Store-assigned patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "No patient with that id", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Delete a patient
///
/// Hard delete. Deleting an id that no longer exists answers `404`, so a
/// repeated delete is indistinguishable from deleting an id that never
/// existed.
///
/// # Errors
/// Returns `404 Not Found` when the id does not match a record, or
/// `500 Internal Server Error` when the store fails.
#[axum::debug_handler]
pub async fn delete_paciente(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ErrorResponse> {
    let Some(id) = parse_id(&id) else {
        return Err(patient_not_found());
    };

    match state.repository.delete(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(patient_not_found()),
        Err(e) => Err(storage_failed(&state, "delete patient", &e)),
    }
}

/// Fallback for unmatched routes.
pub async fn route_not_found(uri: Uri) -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(format!("Route not found: {}", uri.path()))),
    )
}

// Non-integer id segments collapse into "not found" rather than a distinct
// bad-request class: such an id can never match a stored record.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn patient_not_found() -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("Patient not found")),
    )
}

fn not_an_object() -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::with_errors(
            "Validation error",
            vec!["request body must be a JSON object".to_owned()],
        )),
    )
}

fn validation_rejected(violations: Vec<Violation>) -> ErrorResponse {
    tracing::warn!(violations = violations.len(), "validation rejected request");
    let errors = violations.into_iter().map(|v| v.message).collect();
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::with_errors("Validation error", errors)),
    )
}

fn storage_failed(state: &AppState, operation: &str, e: &PatientError) -> ErrorResponse {
    tracing::error!("{operation} error: {e:?}");

    let message = if state.cfg.expose_error_detail() {
        format!("Internal server error: {e}")
    } else {
        "Internal server error".to_owned()
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(message)))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
