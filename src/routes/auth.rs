//! Google Calendar connection endpoints.

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::routes::members::SuccessResponse;
use crate::routes::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/url", get(consent_url))
        .route("/api/auth/callback", post(callback))
        .route("/api/auth", delete(disconnect))
        .route("/api/auth/status", get(status))
}

#[derive(Serialize)]
pub struct ConsentUrlResponse {
    pub url: String,
}

/// GET /api/auth/url - OAuth consent URL to open in a browser.
async fn consent_url(State(state): State<AppState>) -> Result<Json<ConsentUrlResponse>, ApiError> {
    let url = state.google_auth()?.consent_url();
    Ok(Json(ConsentUrlResponse { url }))
}

#[derive(Deserialize)]
pub struct CallbackRequest {
    pub code: String,
}

/// POST /api/auth/callback - Exchange the consent code and connect the
/// calendar mirror.
async fn callback(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let credential = state.google_auth()?.exchange_code(&request.code).await?;
    state.ledger.mirror().connect(credential).await;
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/auth - Drop the credential; future bookings stop mirroring.
async fn disconnect(State(state): State<AppState>) -> Result<Json<SuccessResponse>, ApiError> {
    state.ledger.mirror().disconnect().await;
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub connected: bool,
}

/// GET /api/auth/status
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        connected: state.ledger.mirror().is_connected().await,
    })
}
