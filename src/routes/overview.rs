//! Team-wide read endpoints: the absence heatmap and celebration lookups.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use offdays_core::heatmap::{self, DayOccupancy, TeamFilter};

use crate::routes::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/overview/heatmap", get(absence_heatmap))
        .route("/api/overview/celebrations", get(celebrations))
}

#[derive(Deserialize)]
pub struct HeatmapQuery {
    pub team: Option<String>,
}

/// GET /api/overview/heatmap?team=
///
/// Every vacation day across the (optionally filtered) roster, keyed by
/// date, with the number of absent people and their names.
async fn absence_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<BTreeMap<NaiveDate, DayOccupancy>>, ApiError> {
    let persons = state.ledger.persons()?;
    let filter = TeamFilter::from_query(query.team.as_deref());
    Ok(Json(heatmap::aggregate(&persons, &filter)))
}

#[derive(Deserialize)]
pub struct CelebrationsQuery {
    pub month: u32,
    pub day: u32,
    pub team: Option<String>,
}

#[derive(Serialize)]
pub struct CelebrationsResponse {
    pub birthdays: Vec<String>,
    pub anniversaries: Vec<String>,
}

/// GET /api/overview/celebrations?month=&day=&team=
///
/// Birthdays and hiring anniversaries falling on a calendar day,
/// ignoring the year.
async fn celebrations(
    State(state): State<AppState>,
    Query(query): Query<CelebrationsQuery>,
) -> Result<Json<CelebrationsResponse>, ApiError> {
    let persons = state.ledger.persons()?;
    let filter = TeamFilter::from_query(query.team.as_deref());

    let birthdays = heatmap::birthdays_on(&persons, query.month, query.day, &filter)
        .into_iter()
        .map(String::from)
        .collect();
    let anniversaries = heatmap::anniversaries_on(&persons, query.month, query.day, &filter)
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(CelebrationsResponse {
        birthdays,
        anniversaries,
    }))
}
