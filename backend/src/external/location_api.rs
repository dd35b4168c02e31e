//! Client for a deployed instance's `/getLocationData` endpoint
//!
//! The refresh job goes through the public API, so cached district data is
//! produced by exactly the code path external callers see.

use reqwest::Client;
use shared::{Coordinate, GroupedRecord};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct LocationApiClient {
    client: Client,
    base_url: String,
}

impl LocationApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the grouped 7-day record; `None` when the API answers `null`
    pub async fn get_location_data(
        &self,
        coordinate: Coordinate,
    ) -> AppResult<Option<GroupedRecord>> {
        let url = format!("{}/getLocationData", self.base_url);
        let query = [
            ("locationLatitude", coordinate.latitude.to_string()),
            ("locationLongitude", coordinate.longitude.to_string()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Location API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Location API error: {} - {}",
                status, body
            )));
        }

        response
            .json::<Option<GroupedRecord>>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse location data: {}", e)))
    }
}
