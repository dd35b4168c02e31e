//! HTTP handler for cached district data

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{parse_district_id, DailyRow};

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DistrictQuery {
    #[serde(rename = "districtID")]
    pub district_id: Option<String>,
}

/// The seven cached daily rows for a district, or `null` when nothing usable
/// is cached for it yet
pub async fn get_district_data(
    State(state): State<AppState>,
    Query(query): Query<DistrictQuery>,
) -> AppResult<Json<Option<Vec<DailyRow>>>> {
    let district_id = parse_district_id(query.district_id.as_deref())?.to_string();

    let rows = state
        .cache
        .district(&district_id)
        .await?
        .map(|document| document.into_rows());

    Ok(Json(rows))
}
