//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Number of days covered by every series
pub const HORIZON_DAYS: usize = 7;

/// Hourly samples that make up one day
pub const HOURS_PER_DAY: usize = 24;

/// One value per forecast day, index 0 = today
pub type DailySeries = [Option<f64>; HORIZON_DAYS];

/// A series with no data for any day
pub const EMPTY_SERIES: DailySeries = [None; HORIZON_DAYS];

/// Fill a series with the same value for every day
pub fn broadcast(value: Option<f64>) -> DailySeries {
    [value; HORIZON_DAYS]
}

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}
