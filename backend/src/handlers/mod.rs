//! HTTP handlers for the public API

pub mod district;
pub mod health;
pub mod location;

pub use district::get_district_data;
pub use health::health_check;
pub use location::get_location_data;
