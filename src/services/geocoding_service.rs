use crate::config::NominatimConfig;
use crate::models::place::Coordinates;
use async_trait::async_trait;
use reqwest::{header::USER_AGENT, Client};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str, city: &str) -> Result<Option<Coordinates>, GeocodingError>;
}

#[derive(Debug)]
pub enum GeocodingError {
    HttpError(reqwest::Error),
    ResponseError(String),
}

impl fmt::Display for GeocodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodingError::HttpError(err) => write!(f, "HTTP error: {}", err),
            GeocodingError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl std::error::Error for GeocodingError {}

impl From<reqwest::Error> for GeocodingError {
    fn from(err: reqwest::Error) -> Self {
        GeocodingError::HttpError(err)
    }
}

// Nominatim reports coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

impl NominatimResult {
    fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Some(Coordinates { lat, lon })
    }
}

/// OpenStreetMap Nominatim search.
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn new(config: &NominatimConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, place: &str, city: &str) -> Result<Option<Coordinates>, GeocodingError> {
        let query = if city.trim().is_empty() {
            place.to_string()
        } else {
            format!("{}, {}", place, city)
        };

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .header(USER_AGENT, &self.user_agent)
            .query(&[("format", "json"), ("q", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodingError::ResponseError(format!(
                "Geocoding request failed with status {}",
                status
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| GeocodingError::ResponseError(format!("Failed to parse response: {}", e)))?;

        Ok(results.first().and_then(NominatimResult::coordinates))
    }
}
