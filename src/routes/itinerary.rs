use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{GenerateItineraryRequest, PlanResponse},
    routes::AppState,
};

/// Handler for the itinerary generation endpoint
///
/// Every failure, including a malformed body, is answered with the JSON error
/// envelope rather than an HTTP error status.
pub async fn generate_itinerary(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<GenerateItineraryRequest>, JsonRejection>,
) -> AppResult<Json<PlanResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(request_id = %request_id, error = %rejection, "Rejected request body");
        AppError::InvalidInput(rejection.body_text())
    })?;

    tracing::info!(
        request_id = %request_id,
        input_chars = request.user_input.chars().count(),
        "Processing itinerary request"
    );

    let started = Instant::now();
    let result = state.planner.plan(&request.user_input).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(response) => tracing::info!(
            request_id = %request_id,
            destination = %response.travel_plan.destination,
            days = response.travel_plan.days.len(),
            elapsed_ms,
            "Itinerary generated"
        ),
        Err(e) => tracing::warn!(
            request_id = %request_id,
            error = %e,
            elapsed_ms,
            "Itinerary generation failed"
        ),
    }

    result.map(Json)
}
