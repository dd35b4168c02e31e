//! Earth Engine REST client for MODIS vegetation indices
//!
//! Authentication happens once per process, on first use. Every caller
//! shares the same session; concurrent first callers wait on a single
//! in-flight sign-in instead of each exchanging their own token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::Coordinate;
use tokio::sync::{Mutex, OnceCell};

use crate::config::EarthEngineConfig;
use crate::error::{AppError, AppResult};

const EARTH_ENGINE_SCOPE: &str = "https://www.googleapis.com/auth/earthengine";
const PUBLIC_CATALOG: &str = "earthengine-public";
const DEFAULT_PROJECT: &str = "earthengine-legacy";
const SAMPLE_SCALE_METRES: u32 = 500;

// Refresh a little before the server-side expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// 16-day vegetation indices
pub const NDVI_EVI_COLLECTION: VegetationProduct = VegetationProduct {
    collection: "MODIS/061/MOD13A1",
    bands: ("NDVI", "EVI"),
};

/// 4-day leaf area index / absorbed radiation fraction
pub const LAI_FPAR_COLLECTION: VegetationProduct = VegetationProduct {
    collection: "MODIS/061/MCD15A3H",
    bands: ("Lai", "Fpar"),
};

/// An image collection and the two bands sampled from it
#[derive(Debug, Clone, Copy)]
pub struct VegetationProduct {
    pub collection: &'static str,
    pub bands: (&'static str, &'static str),
}

/// How the client proves its identity
#[derive(Clone)]
pub enum Credentials {
    /// Bearer token issued elsewhere; used as-is
    AccessToken(String),
    /// Service-account key, exchanged for short-lived tokens
    ServiceAccount(ServiceAccountKey),
}

/// Fields of a Google service-account key file
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct AccessToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// Authenticated state, created once
struct Session {
    token: Mutex<AccessToken>,
}

#[derive(Debug, Deserialize)]
struct ListImagesResponse {
    #[serde(default)]
    images: Vec<ImageSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageSummary {
    id: Option<String>,
    name: Option<String>,
    start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ComputeResponse {
    result: Option<Value>,
}

/// Earth Engine API client
pub struct EarthEngineClient {
    client: Client,
    base_url: String,
    token_uri: String,
    project: String,
    credentials: Credentials,
    session: OnceCell<Session>,
}

impl EarthEngineClient {
    pub fn new(
        client: Client,
        base_url: String,
        token_uri: String,
        project: String,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_uri,
            project,
            credentials,
            session: OnceCell::new(),
        }
    }

    /// Build a client from configuration. Returns `Ok(None)` when no
    /// credentials are configured at all.
    pub fn from_config(client: Client, config: &EarthEngineConfig) -> AppResult<Option<Self>> {
        if let Some(token) = config.access_token.as_ref().filter(|t| !t.is_empty()) {
            let project = config
                .project
                .clone()
                .unwrap_or_else(|| DEFAULT_PROJECT.to_string());
            return Ok(Some(Self::new(
                client,
                config.base_url.clone(),
                config.token_uri.clone(),
                project,
                Credentials::AccessToken(token.clone()),
            )));
        }

        let raw_key = match (&config.service_account_key, &config.service_account_key_path) {
            (Some(inline), _) if !inline.is_empty() => inline.clone(),
            (_, Some(path)) if !path.is_empty() => std::fs::read_to_string(path).map_err(|e| {
                AppError::Configuration(format!("cannot read service account key {}: {}", path, e))
            })?,
            _ => return Ok(None),
        };

        let key: ServiceAccountKey = serde_json::from_str(&raw_key).map_err(|e| {
            AppError::Configuration(format!("invalid service account key: {}", e))
        })?;

        let project = config
            .project
            .clone()
            .or_else(|| key.project_id.clone())
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());
        let token_uri = key
            .token_uri
            .clone()
            .unwrap_or_else(|| config.token_uri.clone());

        Ok(Some(Self::new(
            client,
            config.base_url.clone(),
            token_uri,
            project,
            Credentials::ServiceAccount(key),
        )))
    }

    /// Point-sampled NDVI and EVI from the first 16-day composite in the window
    pub async fn fetch_ndvi_evi(
        &self,
        coordinate: Coordinate,
        start_date: &str,
        end_date: &str,
    ) -> (Option<f64>, Option<f64>) {
        self.sample_product(NDVI_EVI_COLLECTION, coordinate, start_date, end_date)
            .await
    }

    /// Point-sampled LAI and FPAR from the first 4-day composite in the window
    pub async fn fetch_lai_fpar(
        &self,
        coordinate: Coordinate,
        start_date: &str,
        end_date: &str,
    ) -> (Option<f64>, Option<f64>) {
        self.sample_product(LAI_FPAR_COLLECTION, coordinate, start_date, end_date)
            .await
    }

    async fn sample_product(
        &self,
        product: VegetationProduct,
        coordinate: Coordinate,
        start_date: &str,
        end_date: &str,
    ) -> (Option<f64>, Option<f64>) {
        match self
            .try_sample_product(product, coordinate, start_date, end_date)
            .await
        {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(
                    "Error sampling {} at {}: {}",
                    product.collection,
                    coordinate,
                    e
                );
                (None, None)
            }
        }
    }

    async fn try_sample_product(
        &self,
        product: VegetationProduct,
        coordinate: Coordinate,
        start_date: &str,
        end_date: &str,
    ) -> AppResult<(Option<f64>, Option<f64>)> {
        let Some(image_id) = self
            .first_image(product.collection, start_date, end_date)
            .await?
        else {
            tracing::debug!(
                "No {} composites between {} and {}",
                product.collection,
                start_date,
                end_date
            );
            return Ok((None, None));
        };

        let expression = reduce_region_expression(&image_id, product.bands, coordinate);
        let url = format!("{}/projects/{}/value:compute", self.base_url, self.project);
        let response: ComputeResponse = self
            .authorized_json(self.client.post(&url).json(&json!({ "expression": expression })))
            .await?;

        let sampled = response.result.unwrap_or(Value::Null);
        Ok((
            band_value(&sampled, product.bands.0),
            band_value(&sampled, product.bands.1),
        ))
    }

    /// Id of the first image of `collection` inside the window
    async fn first_image(
        &self,
        collection: &str,
        start_date: &str,
        end_date: &str,
    ) -> AppResult<Option<String>> {
        let url = format!(
            "{}/projects/{}/assets/{}:listImages",
            self.base_url, PUBLIC_CATALOG, collection
        );
        let query = [
            ("startTime", format!("{}T00:00:00Z", start_date)),
            ("endTime", format!("{}T00:00:00Z", end_date)),
        ];
        let listing: ListImagesResponse = self
            .authorized_json(self.client.get(&url).query(&query))
            .await?;

        let Some(image) = listing.images.into_iter().next() else {
            return Ok(None);
        };
        tracing::debug!(
            "Sampling {} composite starting {:?}",
            collection,
            image.start_time
        );

        Ok(image.id.or_else(|| {
            image
                .name
                .as_deref()
                .and_then(|n| n.split("/assets/").nth(1))
                .map(str::to_string)
        }))
    }

    async fn authorized_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> AppResult<T> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Earth Engine request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Earth Engine error: {} - {}",
                status, body
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse Earth Engine response: {}", e))
        })
    }

    /// Current bearer token, signing in on first use
    async fn access_token(&self) -> AppResult<String> {
        let session = self
            .session
            .get_or_try_init(|| async {
                let token = self.request_token().await?;
                tracing::info!("Earth Engine initialized successfully!");
                Ok::<_, AppError>(Session {
                    token: Mutex::new(token),
                })
            })
            .await?;

        let mut token = session.token.lock().await;
        if token.is_expired(Utc::now()) {
            tracing::debug!("Earth Engine token expired, refreshing");
            *token = self.request_token().await?;
        }
        Ok(token.value.clone())
    }

    async fn request_token(&self) -> AppResult<AccessToken> {
        let key = match &self.credentials {
            Credentials::AccessToken(value) => {
                return Ok(AccessToken {
                    value: value.clone(),
                    expires_at: None,
                })
            }
            Credentials::ServiceAccount(key) => key,
        };

        let now = Utc::now();
        let claims = Claims {
            iss: &key.client_email,
            scope: EARTH_ENGINE_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Configuration(format!("invalid service account key: {}", e)))?;
        let assertion = jsonwebtoken::encode(&header, &claims, &signing_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token request: {}", e)))?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Earth Engine authentication failed: {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse token response: {}", e))
        })?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| now + Duration::seconds(secs - EXPIRY_MARGIN_SECS)),
        })
    }
}

/// `Image.reduceRegion(Image.select(Image.load(id), bands), mean, Point)`
fn reduce_region_expression(
    image_id: &str,
    bands: (&str, &str),
    coordinate: Coordinate,
) -> Value {
    json!({
        "result": "0",
        "values": {
            "0": {
                "functionInvocationValue": {
                    "functionName": "Image.reduceRegion",
                    "arguments": {
                        "image": {
                            "functionInvocationValue": {
                                "functionName": "Image.select",
                                "arguments": {
                                    "input": {
                                        "functionInvocationValue": {
                                            "functionName": "Image.load",
                                            "arguments": { "id": { "constantValue": image_id } }
                                        }
                                    },
                                    "bandSelectors": { "constantValue": [bands.0, bands.1] }
                                }
                            }
                        },
                        "reducer": {
                            "functionInvocationValue": {
                                "functionName": "Reducer.mean",
                                "arguments": {}
                            }
                        },
                        "geometry": {
                            "functionInvocationValue": {
                                "functionName": "GeometryConstructors.Point",
                                "arguments": {
                                    "coordinates": {
                                        "constantValue": [coordinate.longitude, coordinate.latitude]
                                    }
                                }
                            }
                        },
                        "scale": { "constantValue": SAMPLE_SCALE_METRES }
                    }
                }
            }
        }
    })
}

/// Band mean from a reduceRegion result; zero counts as no data
fn band_value(result: &Value, band: &str) -> Option<f64> {
    result
        .get(band)
        .and_then(Value::as_f64)
        .filter(|v| *v != 0.0)
}
