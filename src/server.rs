//! Axum router construction and route dispatch.
//!
//! The [`app`] function wires every route to its handler and returns a
//! ready-to-serve [`axum::Router`].  Dispatch is an explicit route table:
//! method+path decides the operation, the protected listing route checks
//! the shared-secret header before anything touches the store, and every
//! unmatched method or path falls through to a fixed 404.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::errors::{generate_request_id, ApiError};
use crate::handlers;
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the Waypost API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Waypost API",
        version = "0.1.0",
        description = "Geolocation check-in service backed by object storage"
    ),
    paths(
        ping,
        health_check,
        crate::handlers::location::submit_location,
        crate::handlers::location::list_locations,
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Location", description = "Check-in submission and listing"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all routes.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint (infrastructure, not part of the check-in API).
        .route("/health", get(health_check))
        // Prometheus metrics endpoint.
        .route("/metrics", get(metrics_handler))
        // OpenAPI spec.
        .route("/openapi.json", get(openapi_spec))
        // Check-in API.
        .route("/ping", get(ping).fallback(not_found))
        .route(
            "/location",
            post(handle_submit_location)
                .get(handle_list_locations)
                .fallback(not_found),
        )
        // Static assets.
        .route("/", get(handle_index).fallback(not_found))
        .route("/admin", get(handle_admin).fallback(not_found))
        .route("/resources/*path", get(handle_resource).fallback(not_found))
        // Unmatched routes: fixed 404, no other verbs recognized.
        .fallback(not_found)
        // Application state shared across all handlers.
        .with_state(state)
        // Layer ordering: inner layers run first, outer layers wrap them.
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// -- Common headers middleware -----------------------------------------------

/// Tower middleware that adds common response headers to every response:
/// - `x-request-id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `Waypost`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    if !headers.contains_key("x-request-id") {
        let request_id = generate_request_id();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    // Always overwrite Date and Server to ensure consistency.
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static("Waypost"));

    response
}

// -- Authorization -------------------------------------------------------------

/// Compare the `password` request header against the configured secret in
/// constant time.  A missing header never matches.
fn password_matches(headers: &HeaderMap, expected: &str) -> bool {
    let provided = headers
        .get("password")
        .map(|v| v.as_bytes())
        .unwrap_or(&[]);
    provided.ct_eq(expected.as_bytes()).into()
}

// -- Infrastructure handlers ---------------------------------------------------

/// `GET /ping` -- liveness probe, returns the literal `online`.
#[utoipa::path(
    get,
    path = "/ping",
    tag = "Health",
    operation_id = "Ping",
    responses(
        (status = 200, description = "Service is online, body is the literal \"online\"")
    )
)]
async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "online")
}

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// `GET /openapi.json` -- serve the generated OpenAPI document.
async fn openapi_spec() -> impl IntoResponse {
    axum::Json(ApiDoc::openapi())
}

/// Shared 404 for unmatched routes and unrecognized verbs.
async fn not_found() -> ApiError {
    ApiError::NotFound
}

// -- Route dispatch ------------------------------------------------------------

/// `POST /location` -- SubmitLocation.
async fn handle_submit_location(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<Response, ApiError> {
    handlers::location::submit_location(state, &body).await
}

/// `GET /location` -- ListLocations, behind the shared-secret check.
///
/// The password is verified before any store access.
async fn handle_list_locations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if !password_matches(&headers, &state.config.auth.password) {
        return Err(ApiError::WrongPassword);
    }
    handlers::location::list_locations(state).await
}

/// `GET /` -- index page.
async fn handle_index(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    handlers::assets::serve_index(state).await
}

/// `GET /admin` -- admin page.
async fn handle_admin(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    handlers::assets::serve_admin(state).await
}

/// `GET /resources/*path` -- static asset by extension.
async fn handle_resource(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    handlers::assets::serve_resource(state, &path).await
}

// -- Tests ---------------------------------------------------------------------
