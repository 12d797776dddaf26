use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::TripPlanner,
};

pub mod itinerary;

/// Shared application state
pub struct AppState {
    pub planner: TripPlanner,
}

impl AppState {
    pub fn new(planner: TripPlanner) -> Self {
        Self { planner }
    }
}

/// Creates the application router with all routes
///
/// The request-id layer wraps the trace layer so every span carries the id.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/generate-itinerary", post(itinerary::generate_itinerary))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

/// A panicking handler still answers with the error envelope
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");

    AppError::Internal(detail.to_string()).into_response()
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
