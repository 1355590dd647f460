use crate::config::SerpConfig;
use crate::models::place::{deserialize_review_texts, PlaceInfo};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[async_trait]
pub trait PlaceEnrichmentProvider: Send + Sync {
    /// `Ok(None)` when the provider has no match for the place.
    async fn lookup(&self, place: &str, city: &str) -> Result<Option<PlaceInfo>, PlaceLookupError>;
}

#[derive(Debug)]
pub enum PlaceLookupError {
    HttpError(reqwest::Error),
    ResponseError(String),
}

impl fmt::Display for PlaceLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceLookupError::HttpError(err) => write!(f, "HTTP error: {}", err),
            PlaceLookupError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl std::error::Error for PlaceLookupError {}

impl From<reqwest::Error> for PlaceLookupError {
    fn from(err: reqwest::Error) -> Self {
        PlaceLookupError::HttpError(err)
    }
}

#[derive(Debug, Deserialize)]
struct SerpSearchResponse {
    local_results: Option<Vec<SerpPlace>>,
    place_results: Option<SerpPlace>,
}

#[derive(Debug, Deserialize)]
struct SerpPlace {
    rating: Option<f64>,
    thumbnail: Option<String>,
    photos: Option<Vec<SerpPhoto>>,
    #[serde(default, deserialize_with = "deserialize_review_texts")]
    reviews: Option<Vec<String>>,
    address: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpPhoto {
    thumbnail: Option<String>,
}

impl From<SerpPlace> for PlaceInfo {
    fn from(place: SerpPlace) -> Self {
        let image = place.thumbnail.or_else(|| {
            place
                .photos
                .and_then(|photos| photos.into_iter().next())
                .and_then(|photo| photo.thumbnail)
        });

        PlaceInfo {
            rating: place.rating,
            image,
            reviews: place.reviews,
            address: place.address,
            link: place.link,
        }
    }
}

/// SerpAPI, `google_maps` engine.
#[derive(Clone)]
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(config: &SerpConfig) -> Result<Self, PlaceLookupError> {
        // Per-call deadlines are applied by the enrichment fan-out; this one
        // only keeps a stuck connection from living forever.
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PlaceEnrichmentProvider for SerpApiClient {
    async fn lookup(&self, place: &str, city: &str) -> Result<Option<PlaceInfo>, PlaceLookupError> {
        let query = format!("{} {}", place, city);
        let url = format!("{}/search.json", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.trim()),
                ("engine", "google_maps"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaceLookupError::ResponseError(format!(
                "Search request failed with status {}",
                status
            )));
        }

        let search: SerpSearchResponse = response
            .json()
            .await
            .map_err(|e| PlaceLookupError::ResponseError(format!("Failed to parse response: {}", e)))?;

        let best = search
            .local_results
            .and_then(|results| results.into_iter().next())
            .or(search.place_results);

        Ok(best.map(PlaceInfo::from))
    }
}
