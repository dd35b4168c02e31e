//! Open-Meteo client for elevation and forecast data
//!
//! Both endpoints are keyless. Failures never leave this module: callers get
//! `None` and a log line.

use reqwest::Client;
use serde::Deserialize;
use shared::{
    aggregation::{daily_means, fit_daily, soil_moisture, soil_temperature},
    Coordinate, WeatherBundle, SERVICE_TIME_ZONE,
};

use crate::config::OpenMeteoConfig;

/// Hourly variables requested from the forecast API
pub const HOURLY_VARIABLES: [&str; 11] = [
    "relative_humidity_2m",
    "dew_point_2m",
    "surface_pressure",
    "cloud_cover",
    "wind_speed_10m",
    "soil_temperature_0cm",
    "soil_temperature_6cm",
    "soil_moisture_0_to_1cm",
    "soil_moisture_1_to_3cm",
    "soil_moisture_3_to_9cm",
    "direct_radiation",
];

/// Daily variables requested from the forecast API
pub const DAILY_VARIABLES: [&str; 6] = [
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "rain_sum",
    "wind_speed_10m_max",
    "et0_fao_evapotranspiration",
];

/// Open-Meteo API client
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    elevation_url: String,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    elevation: Option<Vec<Option<f64>>>,
}

type Samples = Option<Vec<Option<f64>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlyBlock {
    relative_humidity_2m: Samples,
    dew_point_2m: Samples,
    surface_pressure: Samples,
    cloud_cover: Samples,
    wind_speed_10m: Samples,
    soil_temperature_0cm: Samples,
    soil_temperature_6cm: Samples,
    soil_moisture_0_to_1cm: Samples,
    soil_moisture_1_to_3cm: Samples,
    soil_moisture_3_to_9cm: Samples,
    direct_radiation: Samples,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DailyBlock {
    weather_code: Samples,
    temperature_2m_max: Samples,
    rain_sum: Samples,
    et0_fao_evapotranspiration: Samples,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    hourly: HourlyBlock,
    #[serde(default)]
    daily: DailyBlock,
}

impl OpenMeteoClient {
    pub fn new(client: Client, config: &OpenMeteoConfig) -> Self {
        Self::with_base_urls(
            client,
            config.forecast_url.clone(),
            config.elevation_url.clone(),
        )
    }

    /// Create a client against custom endpoints (for testing)
    pub fn with_base_urls(client: Client, forecast_url: String, elevation_url: String) -> Self {
        Self {
            client,
            forecast_url,
            elevation_url,
        }
    }

    /// Elevation in metres above sea level at the coordinate
    pub async fn fetch_elevation(&self, coordinate: Coordinate) -> Option<f64> {
        let query = [
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
        ];

        let response = match self.client.get(&self.elevation_url).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error fetching elevation for {}: {}", coordinate, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Elevation API error: {}", response.status());
            return None;
        }

        match response.json::<ElevationResponse>().await {
            Ok(data) => {
                let elevation = data.elevation.and_then(|values| values.into_iter().next().flatten());
                if elevation.is_none() {
                    tracing::warn!("Elevation data not found in the response.");
                }
                elevation
            }
            Err(e) => {
                tracing::warn!("Failed to parse elevation response: {}", e);
                None
            }
        }
    }

    /// 7-day forecast reduced to daily series
    pub async fn fetch_weather(&self, coordinate: Coordinate) -> Option<WeatherBundle> {
        let query = [
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("hourly", HOURLY_VARIABLES.join(",")),
            ("daily", DAILY_VARIABLES.join(",")),
            ("timezone", SERVICE_TIME_ZONE.name().to_string()),
        ];

        let response = match self.client.get(&self.forecast_url).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error fetching weather data for {}: {}", coordinate, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "Failed to fetch weather data. Status: {}",
                response.status()
            );
            return None;
        }

        match response.json::<ForecastResponse>().await {
            Ok(data) => Some(reduce_forecast(data)),
            Err(e) => {
                tracing::warn!("Failed to parse weather response: {}", e);
                None
            }
        }
    }
}

fn reduce_forecast(data: ForecastResponse) -> WeatherBundle {
    let ForecastResponse { hourly, daily } = data;
    let means = |samples: &Samples| daily_means(samples.as_deref());

    WeatherBundle {
        relative_humidity: means(&hourly.relative_humidity_2m),
        dew_point: means(&hourly.dew_point_2m),
        surface_pressure: means(&hourly.surface_pressure),
        cloud_cover: means(&hourly.cloud_cover),
        wind_speed: means(&hourly.wind_speed_10m),
        soil_temperature: soil_temperature(
            means(&hourly.soil_temperature_0cm),
            means(&hourly.soil_temperature_6cm),
        ),
        soil_moisture: soil_moisture(
            means(&hourly.soil_moisture_0_to_1cm),
            means(&hourly.soil_moisture_1_to_3cm),
            means(&hourly.soil_moisture_3_to_9cm),
        ),
        direct_radiation: means(&hourly.direct_radiation),
        weather_code: fit_daily(daily.weather_code),
        temperature: fit_daily(daily.temperature_2m_max),
        rain_sum: fit_daily(daily.rain_sum),
        evapotranspiration: fit_daily(daily.et0_fao_evapotranspiration),
    }
}
