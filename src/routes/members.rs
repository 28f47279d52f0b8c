//! Team member endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use offdays_core::heatmap;
use offdays_core::import::{self, RowError};
use offdays_core::{LedgerError, Person, PersonDraft, PersonPatch};

use crate::routes::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/members", get(list_members).post(create_member))
        .route("/api/members/bulk", post(bulk_create))
        .route("/api/members/import", post(import_roster))
        .route("/api/members/export", get(export_roster))
        .route(
            "/api/members/{id}",
            get(get_member).put(update_member).delete(delete_member),
        )
}

/// GET /api/members - Full roster snapshot
async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    Ok(Json(state.ledger.persons()?))
}

/// Detail view adds the derived balance and tenure.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetail {
    #[serde(flatten)]
    pub person: Person,
    pub remaining_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenure: Option<Tenure>,
}

#[derive(Serialize)]
pub struct Tenure {
    pub years: i32,
    pub months: u32,
}

/// GET /api/members/:id
async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MemberDetail>, ApiError> {
    let person = state.ledger.person(&id)?;
    let today = chrono::Local::now().date_naive();

    let remaining_days = person.remaining_balance();
    let tenure = person.hiring_date.map(|hired| {
        let (years, months) = heatmap::tenure(hired, today);
        Tenure { years, months }
    });

    Ok(Json(MemberDetail {
        person,
        remaining_days,
        tenure,
    }))
}

/// POST /api/members
async fn create_member(
    State(state): State<AppState>,
    Json(draft): Json<PersonDraft>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let person = state.ledger.add_person(draft).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// PUT /api/members/:id
async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PersonPatch>,
) -> Result<Json<Person>, ApiError> {
    Ok(Json(state.ledger.update_person(&id, patch).await?))
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// DELETE /api/members/:id
async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.ledger.remove_person(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Serialize)]
pub struct BulkResponse {
    pub created: Vec<Person>,
    pub rejected: Vec<String>,
}

/// POST /api/members/bulk - Create members from pre-parsed field sets.
/// Rows failing ledger validation are reported, not fatal.
async fn bulk_create(
    State(state): State<AppState>,
    Json(drafts): Json<Vec<PersonDraft>>,
) -> Result<(StatusCode, Json<BulkResponse>), ApiError> {
    let mut response = BulkResponse {
        created: Vec::new(),
        rejected: Vec::new(),
    };

    for draft in drafts {
        match state.ledger.add_person(draft).await {
            Ok(person) => response.created.push(person),
            Err(LedgerError::Validation(reason)) => response.rejected.push(reason),
            Err(other) => return Err(other.into()),
        }
    }

    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub rejected: Vec<RowError>,
}

/// POST /api/members/import - Parse a delimited roster document and add the
/// accepted rows. Per-line parse and validation errors come back with their
/// line numbers.
async fn import_roster(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let report = import::parse_roster(&body);

    let mut imported = 0;
    let mut rejected = report.rejected;

    for row in report.accepted {
        match state.ledger.add_person(row.draft).await {
            Ok(_) => imported += 1,
            Err(LedgerError::Validation(reason)) => rejected.push(RowError {
                line: row.line,
                reason,
            }),
            Err(other) => return Err(other.into()),
        }
    }

    Ok(Json(ImportResponse { imported, rejected }))
}

/// GET /api/members/export - The roster in the delimited format the import
/// endpoint accepts.
async fn export_roster(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let persons = state.ledger.persons()?;
    let csv = import::export_roster(&persons);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"roster_export.csv\"",
            ),
        ],
        csv,
    ))
}
