//! Vacation booking endpoints, nested under a member.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use offdays_core::{VacationBooking, VacationRecord};

use crate::routes::members::SuccessResponse;
use crate::routes::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/members/{id}/vacations", post(book_vacation))
        .route(
            "/api/members/{id}/vacations/{vacation_id}",
            axum::routing::put(update_vacation).delete(cancel_vacation),
        )
}

/// POST /api/members/:id/vacations
async fn book_vacation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(booking): Json<VacationBooking>,
) -> Result<(StatusCode, Json<VacationRecord>), ApiError> {
    let record = state.ledger.add_vacation(&id, booking).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/members/:id/vacations/:vacation_id
async fn update_vacation(
    State(state): State<AppState>,
    Path((id, vacation_id)): Path<(String, String)>,
    Json(booking): Json<VacationBooking>,
) -> Result<Json<VacationRecord>, ApiError> {
    let record = state.ledger.update_vacation(&id, &vacation_id, booking).await?;
    Ok(Json(record))
}

/// DELETE /api/members/:id/vacations/:vacation_id
async fn cancel_vacation(
    State(state): State<AppState>,
    Path((id, vacation_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.ledger.remove_vacation(&id, &vacation_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
