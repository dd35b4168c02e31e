//! HTTP handler for on-demand location data

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{parse_coordinate, GroupedRecord};

use crate::error::AppResult;
use crate::AppState;

/// Query parameters for location data. Both are required; they are kept as
/// raw strings so a missing value maps to a validation error, not a rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub location_latitude: Option<String>,
    pub location_longitude: Option<String>,
}

/// Seven daily rows of environmental data for a coordinate
pub async fn get_location_data(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<GroupedRecord>> {
    let coordinate = parse_coordinate(
        query.location_latitude.as_deref(),
        query.location_longitude.as_deref(),
    )?;

    let record = state.assembler.assemble_grouped(coordinate).await;
    Ok(Json(record))
}
