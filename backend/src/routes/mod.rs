//! Route definitions for the Pyro Predictor API

use axum::{routing::get, Router};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/getLocationData", get(handlers::get_location_data))
        .route("/getDistrictData", get(handlers::get_district_data))
}
