//! Location data assembly tests
//!
//! Every provider is served by a local mock server:
//! - Assembled record shape and values for a fully answered request
//! - Provider failures degrade to null fields, never to an error
//! - Vegetation windows are anchored at the service-zone date

use chrono::{DateTime, TimeZone, Utc};
use pyro_predictor::external::earth_engine::Credentials;
use pyro_predictor::external::{EarthEngineClient, OpenMeteoClient};
use pyro_predictor::services::LocationDataAssembler;
use serde_json::json;
use shared::{Coordinate, LocationField, FIELD_COUNT, HORIZON_DAYS};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NDVI_LIST_PATH: &str = "/v1/projects/earthengine-public/assets/MODIS/061/MOD13A1:listImages";
const LAI_LIST_PATH: &str = "/v1/projects/earthengine-public/assets/MODIS/061/MCD15A3H:listImages";
const COMPUTE_PATH: &str = "/v1/projects/test-project/value:compute";

// ============================================================================
// Fixtures
// ============================================================================

/// 2024-03-15 11:30 in Asia/Kolkata
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap()
}

fn delhi() -> Coordinate {
    Coordinate::new(28.6, 77.2)
}

fn assembler_for(server: &MockServer, with_earth_engine: bool) -> LocationDataAssembler {
    let client = reqwest::Client::new();
    let open_meteo = OpenMeteoClient::with_base_urls(
        client.clone(),
        format!("{}/v1/forecast", server.uri()),
        format!("{}/v1/elevation", server.uri()),
    );
    let earth_engine = with_earth_engine.then(|| {
        Arc::new(EarthEngineClient::new(
            client,
            format!("{}/v1", server.uri()),
            format!("{}/token", server.uri()),
            "test-project".to_string(),
            Credentials::AccessToken("test-token".to_string()),
        ))
    });
    LocationDataAssembler::new(earth_engine, open_meteo)
}

fn hourly(per_day: impl Fn(usize) -> f64) -> Vec<f64> {
    (0..HORIZON_DAYS * 24).map(|h| per_day(h / 24)).collect()
}

async fn mount_open_meteo(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/elevation"))
        .and(query_param("latitude", "28.6"))
        .and(query_param("longitude", "77.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elevation": [216.0] })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("timezone", "Asia/Kolkata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hourly": {
                "time": [],
                "relative_humidity_2m": hourly(|day| 60.0 + day as f64),
                "dew_point_2m": hourly(|_| 10.0),
                "surface_pressure": hourly(|_| 990.5),
                "cloud_cover": hourly(|_| 40.0),
                "wind_speed_10m": hourly(|_| 12.0),
                "soil_temperature_0cm": hourly(|_| 20.0),
                "soil_temperature_6cm": hourly(|_| 24.0),
                "soil_moisture_0_to_1cm": hourly(|_| 0.1),
                "soil_moisture_1_to_3cm": hourly(|_| 0.1),
                "soil_moisture_3_to_9cm": hourly(|_| 0.1),
                "direct_radiation": hourly(|_| 300.0)
            },
            "daily": {
                "time": [],
                "weather_code": [3, 61, 80, 2, 1, 0, 3],
                "temperature_2m_max": [31.5, 30.8, 29.9, 32.0, 33.1, 32.5, 31.0],
                "temperature_2m_min": [18.0, 17.5, 17.0, 18.2, 19.0, 18.8, 18.1],
                "rain_sum": [0.0, 4.2, 11.0, 0.0, 0.0, 0.0, 0.3],
                "wind_speed_10m_max": [20.0, 22.0, 18.0, 15.0, 14.0, 16.0, 19.0],
                "et0_fao_evapotranspiration": [4.1, 3.2, 2.8, 4.5, 4.9, 4.7, 4.2]
            }
        })))
        .mount(server)
        .await;
}

async fn mount_earth_engine(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(NDVI_LIST_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("startTime", "2024-01-15T00:00:00Z"))
        .and(query_param("endTime", "2024-03-15T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [
                { "id": "MODIS/061/MOD13A1/2024_01_17", "startTime": "2024-01-17T00:00:00Z" },
                { "id": "MODIS/061/MOD13A1/2024_02_02", "startTime": "2024-02-02T00:00:00Z" }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(LAI_LIST_PATH))
        .and(query_param("startTime", "2024-02-24T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [
                { "name": "projects/earthengine-public/assets/MODIS/061/MCD15A3H/2024_02_26" }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(COMPUTE_PATH))
        .and(body_string_contains("MODIS/061/MOD13A1/2024_01_17"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "NDVI": 7234, "EVI": 4120 } })),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(COMPUTE_PATH))
        .and(body_string_contains("MODIS/061/MCD15A3H/2024_02_26"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "Lai": 18, "Fpar": 0 } })),
        )
        .mount(server)
        .await;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_record_from_all_providers() {
        let server = MockServer::start().await;
        mount_open_meteo(&server).await;
        mount_earth_engine(&server).await;

        let record = assembler_for(&server, true)
            .assemble_at(fixed_now(), delhi())
            .await;

        assert_eq!(record.longitude, [Some(77.2); 7]);
        assert_eq!(record.latitude, [Some(28.6); 7]);
        assert_eq!(record.months, [Some(3.0); 7]);
        assert_eq!(record.ndvi, [Some(7234.0); 7]);
        assert_eq!(record.evi, [Some(4120.0); 7]);
        assert_eq!(record.lai, [Some(18.0); 7]);
        // zero samples read as missing
        assert_eq!(record.fpar, [None; 7]);
        assert_eq!(record.elevation, [Some(216.0); 7]);

        assert_eq!(record.relative_humidity[0], Some(60.0));
        assert_eq!(record.relative_humidity[6], Some(66.0));
        assert_eq!(record.soil_temperature, [Some(22.0); 7]);
        assert_eq!(record.weather_code[1], Some(61.0));
        assert_eq!(record.temperature[0], Some(31.5));
        assert_eq!(record.rain_sum[2], Some(11.0));
        assert_eq!(record.evapotranspiration[6], Some(4.2));

        // three layers over a divisor of two
        for value in record.soil_moisture {
            assert!((value.unwrap() - 0.15).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_grouped_rows_follow_field_order() {
        let server = MockServer::start().await;
        mount_open_meteo(&server).await;
        mount_earth_engine(&server).await;

        let grouped = assembler_for(&server, true)
            .assemble_at(fixed_now(), delhi())
            .await
            .grouped();

        assert_eq!(grouped.rows().len(), HORIZON_DAYS);
        for (day, row) in grouped.rows().iter().enumerate() {
            assert_eq!(row.len(), FIELD_COUNT);
            assert_eq!(row.get(LocationField::Longitude), Some(77.2));
            assert_eq!(row.get(LocationField::Latitude), Some(28.6));
            assert_eq!(row.get(LocationField::RelativeHumidity), Some(60.0 + day as f64));
        }

        let first = serde_json::to_value(&grouped.rows()[0]).unwrap();
        assert_eq!(first[2], json!(3));
        assert_eq!(first[3], json!(7234));
        assert_eq!(first[16], json!(3));
        assert_eq!(first[17], json!(31.5));
    }

    #[tokio::test]
    async fn test_all_providers_failing_leaves_only_location_fields() {
        // Nothing mounted: every request gets a 404
        let server = MockServer::start().await;

        let record = assembler_for(&server, true)
            .assemble_at(fixed_now(), delhi())
            .await;
        let grouped = record.grouped();

        assert_eq!(grouped.rows().len(), HORIZON_DAYS);
        for row in grouped.rows() {
            assert_eq!(row.len(), FIELD_COUNT);
            for field in LocationField::ALL {
                let value = row.get(field);
                match field {
                    LocationField::Longitude => assert_eq!(value, Some(77.2)),
                    LocationField::Latitude => assert_eq!(value, Some(28.6)),
                    LocationField::Months => assert_eq!(value, Some(3.0)),
                    _ => assert_eq!(value, None, "{} should be null", field.name()),
                }
            }
        }
    }

    #[tokio::test]
    async fn test_forecast_failure_keeps_point_samples() {
        let server = MockServer::start().await;
        mount_earth_engine(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/elevation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elevation": [1450.0] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let record = assembler_for(&server, true)
            .assemble_at(fixed_now(), delhi())
            .await;

        assert_eq!(record.elevation, [Some(1450.0); 7]);
        assert_eq!(record.ndvi, [Some(7234.0); 7]);
        assert_eq!(record.relative_humidity, [None; 7]);
        assert_eq!(record.weather_code, [None; 7]);
        assert_eq!(record.soil_moisture, [None; 7]);
    }

    #[tokio::test]
    async fn test_without_earth_engine_vegetation_is_null() {
        let server = MockServer::start().await;
        mount_open_meteo(&server).await;

        let record = assembler_for(&server, false)
            .assemble_at(fixed_now(), delhi())
            .await;

        assert_eq!(record.ndvi, [None; 7]);
        assert_eq!(record.evi, [None; 7]);
        assert_eq!(record.lai, [None; 7]);
        assert_eq!(record.fpar, [None; 7]);
        assert_eq!(record.elevation, [Some(216.0); 7]);
    }

    #[tokio::test]
    async fn test_empty_image_listing_gives_null_indices() {
        let server = MockServer::start().await;
        mount_open_meteo(&server).await;
        Mock::given(method("GET"))
            .and(path(NDVI_LIST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(LAI_LIST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "images": [] })))
            .mount(&server)
            .await;

        let record = assembler_for(&server, true)
            .assemble_at(fixed_now(), delhi())
            .await;

        assert_eq!(record.ndvi, [None; 7]);
        assert_eq!(record.lai, [None; 7]);
        assert_eq!(record.temperature[0], Some(31.5));
    }

    #[tokio::test]
    async fn test_months_roll_over_at_month_end() {
        let server = MockServer::start().await;

        // 2024-03-28 in Kolkata: four March days then three April days
        let now = Utc.with_ymd_and_hms(2024, 3, 28, 0, 0, 0).unwrap();
        let record = assembler_for(&server, false).assemble_at(now, delhi()).await;

        assert_eq!(
            record.months,
            [Some(3.0), Some(3.0), Some(3.0), Some(3.0), Some(4.0), Some(4.0), Some(4.0)]
        );
    }
}
