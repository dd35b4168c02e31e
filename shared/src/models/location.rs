//! Location records: the 7-day environmental matrix for one coordinate

use serde::{Deserialize, Serialize, Serializer};

use crate::types::{broadcast, Coordinate, DailySeries, HORIZON_DAYS};

/// Fields of a location record, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationField {
    Longitude,
    Latitude,
    Months,
    Ndvi,
    Evi,
    Lai,
    Fpar,
    Elevation,
    RelativeHumidity,
    DewPoint,
    SurfacePressure,
    CloudCover,
    WindSpeed,
    SoilTemperature,
    SoilMoisture,
    DirectRadiation,
    WeatherCode,
    Temperature,
    RainSum,
    Evapotranspiration,
}

impl LocationField {
    pub const ALL: [LocationField; 20] = [
        LocationField::Longitude,
        LocationField::Latitude,
        LocationField::Months,
        LocationField::Ndvi,
        LocationField::Evi,
        LocationField::Lai,
        LocationField::Fpar,
        LocationField::Elevation,
        LocationField::RelativeHumidity,
        LocationField::DewPoint,
        LocationField::SurfacePressure,
        LocationField::CloudCover,
        LocationField::WindSpeed,
        LocationField::SoilTemperature,
        LocationField::SoilMoisture,
        LocationField::DirectRadiation,
        LocationField::WeatherCode,
        LocationField::Temperature,
        LocationField::RainSum,
        LocationField::Evapotranspiration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LocationField::Longitude => "longitude",
            LocationField::Latitude => "latitude",
            LocationField::Months => "months",
            LocationField::Ndvi => "ndvi",
            LocationField::Evi => "evi",
            LocationField::Lai => "lai",
            LocationField::Fpar => "fpar",
            LocationField::Elevation => "elevation",
            LocationField::RelativeHumidity => "relative_humidity",
            LocationField::DewPoint => "dew_point",
            LocationField::SurfacePressure => "surface_pressure",
            LocationField::CloudCover => "cloud_cover",
            LocationField::WindSpeed => "wind_speed",
            LocationField::SoilTemperature => "soil_temperature",
            LocationField::SoilMoisture => "soil_moisture",
            LocationField::DirectRadiation => "direct_radiation",
            LocationField::WeatherCode => "weather_code",
            LocationField::Temperature => "temperature",
            LocationField::RainSum => "rain_sum",
            LocationField::Evapotranspiration => "evapotranspiration",
        }
    }

    /// Position of the field inside a grouped row
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|f| f == self)
            .unwrap_or_default()
    }
}

/// Number of values in every grouped row
pub const FIELD_COUNT: usize = LocationField::ALL.len();

/// Point samples from the vegetation and elevation providers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointSamples {
    pub ndvi: Option<f64>,
    pub evi: Option<f64>,
    pub lai: Option<f64>,
    pub fpar: Option<f64>,
    pub elevation: Option<f64>,
}

/// Daily weather series derived from the forecast provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub relative_humidity: DailySeries,
    pub dew_point: DailySeries,
    pub surface_pressure: DailySeries,
    pub cloud_cover: DailySeries,
    pub wind_speed: DailySeries,
    pub soil_temperature: DailySeries,
    pub soil_moisture: DailySeries,
    pub direct_radiation: DailySeries,
    pub weather_code: DailySeries,
    pub temperature: DailySeries,
    pub rain_sum: DailySeries,
    pub evapotranspiration: DailySeries,
}

impl Default for WeatherBundle {
    fn default() -> Self {
        Self {
            relative_humidity: broadcast(None),
            dew_point: broadcast(None),
            surface_pressure: broadcast(None),
            cloud_cover: broadcast(None),
            wind_speed: broadcast(None),
            soil_temperature: broadcast(None),
            soil_moisture: broadcast(None),
            direct_radiation: broadcast(None),
            weather_code: broadcast(None),
            temperature: broadcast(None),
            rain_sum: broadcast(None),
            evapotranspiration: broadcast(None),
        }
    }
}

/// Field-major view of the 7-day matrix for one coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub longitude: DailySeries,
    pub latitude: DailySeries,
    pub months: DailySeries,
    pub ndvi: DailySeries,
    pub evi: DailySeries,
    pub lai: DailySeries,
    pub fpar: DailySeries,
    pub elevation: DailySeries,
    pub relative_humidity: DailySeries,
    pub dew_point: DailySeries,
    pub surface_pressure: DailySeries,
    pub cloud_cover: DailySeries,
    pub wind_speed: DailySeries,
    pub soil_temperature: DailySeries,
    pub soil_moisture: DailySeries,
    pub direct_radiation: DailySeries,
    pub weather_code: DailySeries,
    pub temperature: DailySeries,
    pub rain_sum: DailySeries,
    pub evapotranspiration: DailySeries,
}

impl LocationRecord {
    /// Merge provider results into a record. Point samples are repeated for
    /// every day; a missing weather bundle leaves every weather field null.
    pub fn assemble(
        coordinate: Coordinate,
        months: [u32; HORIZON_DAYS],
        samples: PointSamples,
        weather: Option<WeatherBundle>,
    ) -> Self {
        let weather = weather.unwrap_or_default();
        Self {
            longitude: broadcast(Some(coordinate.longitude)),
            latitude: broadcast(Some(coordinate.latitude)),
            months: months.map(|m| Some(f64::from(m))),
            ndvi: broadcast(samples.ndvi),
            evi: broadcast(samples.evi),
            lai: broadcast(samples.lai),
            fpar: broadcast(samples.fpar),
            elevation: broadcast(samples.elevation),
            relative_humidity: weather.relative_humidity,
            dew_point: weather.dew_point,
            surface_pressure: weather.surface_pressure,
            cloud_cover: weather.cloud_cover,
            wind_speed: weather.wind_speed,
            soil_temperature: weather.soil_temperature,
            soil_moisture: weather.soil_moisture,
            direct_radiation: weather.direct_radiation,
            weather_code: weather.weather_code,
            temperature: weather.temperature,
            rain_sum: weather.rain_sum,
            evapotranspiration: weather.evapotranspiration,
        }
    }

    pub fn series(&self, field: LocationField) -> &DailySeries {
        match field {
            LocationField::Longitude => &self.longitude,
            LocationField::Latitude => &self.latitude,
            LocationField::Months => &self.months,
            LocationField::Ndvi => &self.ndvi,
            LocationField::Evi => &self.evi,
            LocationField::Lai => &self.lai,
            LocationField::Fpar => &self.fpar,
            LocationField::Elevation => &self.elevation,
            LocationField::RelativeHumidity => &self.relative_humidity,
            LocationField::DewPoint => &self.dew_point,
            LocationField::SurfacePressure => &self.surface_pressure,
            LocationField::CloudCover => &self.cloud_cover,
            LocationField::WindSpeed => &self.wind_speed,
            LocationField::SoilTemperature => &self.soil_temperature,
            LocationField::SoilMoisture => &self.soil_moisture,
            LocationField::DirectRadiation => &self.direct_radiation,
            LocationField::WeatherCode => &self.weather_code,
            LocationField::Temperature => &self.temperature,
            LocationField::RainSum => &self.rain_sum,
            LocationField::Evapotranspiration => &self.evapotranspiration,
        }
    }

    /// Transpose into one row per day
    pub fn grouped(&self) -> GroupedRecord {
        GroupedRecord(std::array::from_fn(|day| {
            DailyRow(
                LocationField::ALL
                    .iter()
                    .map(|field| self.series(*field)[day])
                    .collect(),
            )
        }))
    }
}

/// All field values for a single day, in [`LocationField::ALL`] order.
///
/// Whole numbers are written as JSON integers so month numbers and weather
/// codes keep their integer form on the wire.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct DailyRow(pub Vec<Option<f64>>);

impl DailyRow {
    pub fn get(&self, field: LocationField) -> Option<f64> {
        self.0.get(field.index()).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Largest integer an f64 represents exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

struct Reading(Option<f64>);

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(v as i64)
            }
            Some(v) if v.is_finite() => serializer.serialize_f64(v),
            _ => serializer.serialize_none(),
        }
    }
}

impl Serialize for DailyRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|v| Reading(*v)))
    }
}

/// Day-major view of a [`LocationRecord`]: exactly seven rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedRecord(pub [DailyRow; HORIZON_DAYS]);

impl GroupedRecord {
    pub fn rows(&self) -> &[DailyRow; HORIZON_DAYS] {
        &self.0
    }

    pub fn into_rows(self) -> [DailyRow; HORIZON_DAYS] {
        self.0
    }
}
