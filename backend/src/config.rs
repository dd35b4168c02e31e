//! Configuration management for the Pyro Predictor backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PYRO__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration (used by the postgres document store)
    pub database: DatabaseConfig,

    /// Document store selection
    pub store: StoreConfig,

    /// Outbound HTTP settings
    pub http: HttpConfig,

    /// Open-Meteo forecast and elevation endpoints
    pub open_meteo: OpenMeteoConfig,

    /// Earth Engine access for vegetation indices
    pub earth_engine: EarthEngineConfig,

    /// District refresh job
    pub refresh: RefreshConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Which document store implementation backs the district cache
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenMeteoConfig {
    pub forecast_url: String,
    pub elevation_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarthEngineConfig {
    /// REST API root, e.g. https://earthengine.googleapis.com/v1
    pub base_url: String,

    /// OAuth token endpoint used for service-account exchange
    pub token_uri: String,

    /// Cloud project billed for computations. Falls back to the key's project
    pub project: Option<String>,

    /// Service-account key JSON, inline
    pub service_account_key: Option<String>,

    /// Service-account key JSON, read from a file
    pub service_account_key_path: Option<String>,

    /// Pre-issued bearer token, skips the service-account exchange
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    /// GeoJSON FeatureCollection of district polygons
    pub districts_path: String,

    /// Feature property holding the district name
    pub name_property: String,

    /// Districts skipped forward per run
    pub step: u32,

    /// Cursor used when none has been persisted yet
    pub default_cursor: u32,

    /// Base URL of a deployed API whose /getLocationData the job should call.
    /// When unset the job assembles data in-process.
    pub location_api_url: Option<String>,

    /// Run the job inside the server at this interval
    pub interval_secs: Option<u64>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PYRO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/pyro_predictor")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("store.backend", "postgres")?
            .set_default("http.timeout_secs", 30)?
            .set_default("open_meteo.forecast_url", "https://api.open-meteo.com/v1/forecast")?
            .set_default("open_meteo.elevation_url", "https://api.open-meteo.com/v1/elevation")?
            .set_default("earth_engine.base_url", "https://earthengine.googleapis.com/v1")?
            .set_default("earth_engine.token_uri", "https://oauth2.googleapis.com/token")?
            .set_default("refresh.districts_path", "data/india_districts.geojson")?
            .set_default("refresh.name_property", "dtname")?
            .set_default("refresh.step", 5)?
            .set_default("refresh.default_cursor", 5)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PYRO__ prefix)
            .add_source(
                Environment::with_prefix("PYRO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
