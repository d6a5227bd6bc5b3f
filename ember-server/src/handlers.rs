/// HTTP handlers for the Emberbin server
///
/// Routes:
/// - `POST /api/pastes` - create a paste, returns its id and share link
/// - `GET /api/pastes/:id` - fetch a paste, consuming one view
/// - `GET /p/:id` - share-link route, same contract as the API fetch
/// - `GET /api/healthz` - health probe against the store
/// - `GET /metrics` - Prometheus metrics
///
/// Fetch responses never say why a paste is gone: missing, expired, and
/// view-exhausted pastes all produce the same 404 body.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ember_api::{AccessOutcome, CreateError, CreatePaste, FieldError};
use ember_core::types::{PasteId, Timestamp};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::metrics::{
    encode_metrics, PASTES_CREATED_TOTAL, PASTE_FETCHES_TOTAL, REQUEST_DURATION_SECONDS,
};
use crate::AppState;

/// Request header carrying a caller-supplied "now" (milliseconds since the
/// Unix epoch). Honored on fetch routes only when the server runs with
/// clock overrides enabled; a malformed value falls back to the real clock.
pub const TEST_NOW_HEADER: &str = "x-test-now-ms";

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/pastes", post(create_paste))
        .route("/api/pastes/:id", get(fetch_paste))
        .route("/p/:id", get(fetch_paste))
        .route("/api/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Response body for a created paste
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub id: String,
    pub url: String,
}

/// Response body for a fetched paste
///
/// `remaining_views` is null for unlimited pastes; `expires_at` is
/// milliseconds since the Unix epoch, null when the paste never expires.
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub content: String,
    pub remaining_views: Option<u64>,
    pub expires_at: Option<Timestamp>,
}

/// Create a new paste
async fn create_paste(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreatePaste>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateResponse>), ApiError> {
    let _timer = REQUEST_DURATION_SECONDS
        .with_label_values(&["create_paste"])
        .start_timer();

    let Json(request) = body?;
    let receipt = state.bin.create_paste(request)?;
    PASTES_CREATED_TOTAL.inc();

    info!("Created paste {}", receipt.id);

    let url = share_url(&state, &headers, receipt.id.as_str());
    Ok((
        StatusCode::CREATED,
        Json(CreateResponse {
            id: receipt.id.to_string(),
            url,
        }),
    ))
}

/// Fetch a paste, consuming one view on success
async fn fetch_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FetchResponse>, ApiError> {
    let _timer = REQUEST_DURATION_SECONDS
        .with_label_values(&["fetch_paste"])
        .start_timer();

    let now = state.clock.resolve(requested_now(&headers));
    let id = PasteId::new(id);

    let outcome = state.bin.access(&id, now).map_err(|err| {
        PASTE_FETCHES_TOTAL.with_label_values(&["error"]).inc();
        ApiError::Storage(err)
    })?;

    match outcome {
        AccessOutcome::Ok(grant) => {
            PASTE_FETCHES_TOTAL.with_label_values(&["ok"]).inc();
            let remaining_views = grant.remaining_views();
            let paste = grant.paste;
            Ok(Json(FetchResponse {
                content: paste.content,
                remaining_views,
                expires_at: paste.expires_at,
            }))
        }
        AccessOutcome::NotFound => {
            PASTE_FETCHES_TOTAL.with_label_values(&["not_found"]).inc();
            Err(ApiError::PasteGone)
        }
        AccessOutcome::Expired => {
            PASTE_FETCHES_TOTAL.with_label_values(&["expired"]).inc();
            Err(ApiError::PasteGone)
        }
        AccessOutcome::ViewLimitExceeded => {
            PASTE_FETCHES_TOTAL.with_label_values(&["view_limit"]).inc();
            Err(ApiError::PasteGone)
        }
    }
}

/// Health check endpoint
///
/// Probes the store rather than just answering: a failed status read
/// (e.g. log file IO error) surfaces as a 500.
async fn healthz(State(state): State<AppState>) -> Response {
    match state.bin.status() {
        Ok(_) => {
            let body = Json(serde_json::json!({ "ok": true }));
            (StatusCode::OK, body).into_response()
        }
        Err(err) => {
            error!("Health probe failed: {}", err);
            let body = Json(serde_json::json!({
                "ok": false,
                "error": err.to_string(),
            }));
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics_handler() -> String {
    encode_metrics().unwrap_or_else(|err| {
        error!("Failed to encode metrics: {}", err);
        String::from("# Error encoding metrics\n")
    })
}

/// Parse the test-now header, if present and well formed
fn requested_now(headers: &HeaderMap) -> Option<Timestamp> {
    headers
        .get(TEST_NOW_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Absolute share link for a paste
///
/// Uses the configured public base URL when one was given, otherwise
/// derives one from the request's Host header.
fn share_url(state: &AppState, headers: &HeaderMap, id: &str) -> String {
    let base = match &state.base_url {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };
    format!("{}/p/{}", base, id)
}

/// Application errors mapped onto HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// Request failed validation; carries field-level detail
    BadRequest(Vec<FieldError>),
    /// Request body was not JSON of the expected shape
    MalformedBody(String),
    /// The paste does not exist, has expired, or has no views left.
    /// The three causes are deliberately indistinguishable.
    PasteGone,
    /// The store failed
    Storage(ember_core::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl From<CreateError> for ApiError {
    fn from(err: CreateError) -> Self {
        match err {
            CreateError::Validation(validation) => ApiError::BadRequest(validation.errors),
            CreateError::Storage(err) => ApiError::Storage(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(errors) => {
                let body = Json(serde_json::json!({ "error": errors }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::MalformedBody(message) => {
                let body = Json(serde_json::json!({
                    "error": [{ "field": "body", "message": message }]
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::PasteGone => {
                let body = Json(serde_json::json!({ "error": "Paste not found" }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Storage(err) => {
                error!("Storage error: {}", err);
                let body = Json(serde_json::json!({ "error": "Internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
