//! Validation of client-supplied query values
//!
//! Coordinates are only checked for presence and float syntax; any parsed
//! value is passed through to the providers.

use thiserror::Error;

use crate::types::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Latitude and Longitude are required")]
    MissingCoordinate,

    #[error("District ID required.")]
    MissingDistrictId,

    #[error("{field} is not a valid number: {value}")]
    NotANumber { field: &'static str, value: String },
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build a coordinate from the raw latitude/longitude query values
pub fn parse_coordinate(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Coordinate, ValidationError> {
    let (Some(lat), Some(lon)) = (present(latitude), present(longitude)) else {
        return Err(ValidationError::MissingCoordinate);
    };

    let parse = |field: &'static str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| ValidationError::NotANumber {
                field,
                value: value.to_string(),
            })
    };

    Ok(Coordinate::new(
        parse("locationLatitude", lat)?,
        parse("locationLongitude", lon)?,
    ))
}

/// Parse the district id query value
pub fn parse_district_id(value: Option<&str>) -> Result<u32, ValidationError> {
    let raw = present(value).ok_or(ValidationError::MissingDistrictId)?;
    raw.parse::<u32>().map_err(|_| ValidationError::NotANumber {
        field: "districtID",
        value: raw.to_string(),
    })
}
