//! External API integrations

pub mod earth_engine;
pub mod location_api;
pub mod open_meteo;

pub use earth_engine::EarthEngineClient;
pub use location_api::LocationApiClient;
pub use open_meteo::OpenMeteoClient;
