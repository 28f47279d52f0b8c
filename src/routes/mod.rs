pub mod auth;
pub mod members;
pub mod overview;
pub mod vacations;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use offdays_core::LedgerError;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps ledger errors onto HTTP statuses: validation errors are the
/// caller's fault, unknown ids are 404, everything else (store I/O,
/// credentials) is a server error.
pub struct ApiError(LedgerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::PersonNotFound(_) | LedgerError::VacationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}
