//! Location data assembly: provider results merged into a 7-day matrix

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    date_offset_from, months_from, Coordinate, GroupedRecord, LocationRecord, PointSamples,
};
use std::sync::Arc;

use crate::error::AppResult;
use crate::external::{EarthEngineClient, LocationApiClient, OpenMeteoClient};

/// Days back to search for a 16-day vegetation composite
const NDVI_WINDOW_DAYS: i64 = 60;

/// Days back to search for a 4-day LAI/FPAR composite
const LAI_WINDOW_DAYS: i64 = 20;

/// Anything that can produce the grouped record for a coordinate
#[async_trait]
pub trait LocationDataProvider: Send + Sync {
    async fn location_data(&self, coordinate: Coordinate) -> AppResult<Option<GroupedRecord>>;
}

/// Queries every provider for a coordinate and merges the results
#[derive(Clone)]
pub struct LocationDataAssembler {
    earth_engine: Option<Arc<EarthEngineClient>>,
    open_meteo: OpenMeteoClient,
}

impl LocationDataAssembler {
    pub fn new(earth_engine: Option<Arc<EarthEngineClient>>, open_meteo: OpenMeteoClient) -> Self {
        Self {
            earth_engine,
            open_meteo,
        }
    }

    pub async fn assemble(&self, coordinate: Coordinate) -> LocationRecord {
        self.assemble_at(Utc::now(), coordinate).await
    }

    pub async fn assemble_grouped(&self, coordinate: Coordinate) -> GroupedRecord {
        self.assemble(coordinate).await.grouped()
    }

    /// Assemble the record for the 7 days starting at `now`'s civil date.
    ///
    /// The four provider calls have no data dependency on each other and run
    /// concurrently. Provider failures surface as null fields.
    pub async fn assemble_at(&self, now: DateTime<Utc>, coordinate: Coordinate) -> LocationRecord {
        let ndvi_start = date_offset_from(now, -NDVI_WINDOW_DAYS);
        let lai_start = date_offset_from(now, -LAI_WINDOW_DAYS);
        let today = date_offset_from(now, 0);

        tracing::debug!("Assembling location data for {} on {}", coordinate, today);

        let ((ndvi, evi), (lai, fpar), elevation, weather) = tokio::join!(
            self.vegetation_ndvi_evi(coordinate, &ndvi_start, &today),
            self.vegetation_lai_fpar(coordinate, &lai_start, &today),
            self.open_meteo.fetch_elevation(coordinate),
            self.open_meteo.fetch_weather(coordinate),
        );

        let samples = PointSamples {
            ndvi,
            evi,
            lai,
            fpar,
            elevation,
        };

        LocationRecord::assemble(coordinate, months_from(now), samples, weather)
    }

    async fn vegetation_ndvi_evi(
        &self,
        coordinate: Coordinate,
        start_date: &str,
        end_date: &str,
    ) -> (Option<f64>, Option<f64>) {
        match &self.earth_engine {
            Some(client) => client.fetch_ndvi_evi(coordinate, start_date, end_date).await,
            None => (None, None),
        }
    }

    async fn vegetation_lai_fpar(
        &self,
        coordinate: Coordinate,
        start_date: &str,
        end_date: &str,
    ) -> (Option<f64>, Option<f64>) {
        match &self.earth_engine {
            Some(client) => client.fetch_lai_fpar(coordinate, start_date, end_date).await,
            None => (None, None),
        }
    }
}

#[async_trait]
impl LocationDataProvider for LocationDataAssembler {
    async fn location_data(&self, coordinate: Coordinate) -> AppResult<Option<GroupedRecord>> {
        Ok(Some(self.assemble_grouped(coordinate).await))
    }
}

#[async_trait]
impl LocationDataProvider for LocationApiClient {
    async fn location_data(&self, coordinate: Coordinate) -> AppResult<Option<GroupedRecord>> {
        self.get_location_data(coordinate).await
    }
}
