use crate::config::EnrichmentConfig;
use crate::models::place::{Coordinates, PlaceInfo};
use crate::services::{geocoding_service::Geocoder, place_service::PlaceEnrichmentProvider};
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde_json::{json, Map, Value};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// What the providers returned for one record.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Lookup {
    pub place: Option<PlaceInfo>,
    pub coordinates: Option<Coordinates>,
}

impl Lookup {
    /// Provider values overwrite what the completion provider guessed; absent
    /// provider values leave the record's own fields alone.
    pub fn merge_into(self, record: &mut Map<String, Value>) {
        if let Some(place) = self.place {
            if let Some(rating) = place.rating {
                record.insert("rating".to_string(), json!(rating));
            }
            if let Some(image) = place.image {
                record.insert("image".to_string(), json!(image));
            }
            if let Some(address) = place.address {
                record.insert("address".to_string(), json!(address));
            }
            if let Some(link) = place.link {
                record.insert("link".to_string(), json!(link));
            }
            if let Some(reviews) = place.reviews {
                record.insert("reviews".to_string(), json!(reviews));
            }
        }

        if let Some(coordinates) = self.coordinates {
            record.insert("lat".to_string(), json!(coordinates.lat));
            record.insert("lon".to_string(), json!(coordinates.lon));
        }
    }
}

#[derive(Clone)]
pub struct EnrichmentService {
    places: Option<Arc<dyn PlaceEnrichmentProvider>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    timeout: Duration,
    concurrency: usize,
}

impl EnrichmentService {
    pub fn new(
        places: Option<Arc<dyn PlaceEnrichmentProvider>>,
        geocoder: Option<Arc<dyn Geocoder>>,
        config: &EnrichmentConfig,
    ) -> Self {
        Self {
            places,
            geocoder,
            timeout: config.timeout,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Enrich every `itinerary[*].activities[*]` record, keyed by `location`.
    pub async fn enrich_itinerary(&self, document: &mut Value, city: &str) {
        let mut records = Vec::new();
        if let Some(days) = document.get_mut("itinerary").and_then(Value::as_array_mut) {
            for day in days.iter_mut() {
                if let Some(activities) = day.get_mut("activities").and_then(Value::as_array_mut) {
                    records.extend(activities.iter_mut().filter_map(Value::as_object_mut));
                }
            }
        }

        self.enrich_records(records, "location", city).await;
    }

    /// Enrich a list of place records, keyed by `name`.
    pub async fn enrich_places(&self, places: &mut [Value], city: &str) {
        let records = places.iter_mut().filter_map(Value::as_object_mut).collect();
        self.enrich_records(records, "name", city).await;
    }

    async fn enrich_records(&self, records: Vec<&mut Map<String, Value>>, key: &str, city: &str) {
        let names: Vec<Option<String>> = records
            .iter()
            .map(|record| {
                record
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
            })
            .collect();

        debug!(
            "Enriching {} records in {:?} ({} at a time)",
            names.len(),
            city,
            self.concurrency
        );

        // `buffered` keeps input order, so lookups line up with records.
        let lookups: Vec<Lookup> = stream::iter(names)
            .map(|name| async move {
                match name {
                    Some(name) => self.lookup(&name, city).await,
                    None => Lookup::default(),
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (record, lookup) in records.into_iter().zip(lookups) {
            lookup.merge_into(record);
        }
    }

    /// Both provider calls for one place, concurrently, each under its own deadline.
    pub async fn lookup(&self, name: &str, city: &str) -> Lookup {
        let place = async {
            match &self.places {
                Some(provider) => {
                    self.within_deadline("Place enrichment", name, provider.lookup(name, city))
                        .await
                }
                None => None,
            }
        };
        let coordinates = async {
            match &self.geocoder {
                Some(geocoder) => {
                    self.within_deadline("Geocoding", name, geocoder.geocode(name, city))
                        .await
                }
                None => None,
            }
        };

        let (place, coordinates) = futures::join!(place, coordinates);
        Lookup { place, coordinates }
    }

    /// Place-enrichment data alone, without geocoding.
    pub async fn place_info(&self, name: &str, city: &str) -> Option<PlaceInfo> {
        let provider = self.places.as_ref()?;
        self.within_deadline("Place enrichment", name, provider.lookup(name, city))
            .await
    }

    pub fn has_place_provider(&self) -> bool {
        self.places.is_some()
    }

    // Errors and an expired deadline both mean "no data".
    async fn within_deadline<T, E, F>(&self, what: &str, name: &str, call: F) -> Option<T>
    where
        E: Display,
        F: Future<Output = Result<Option<T>, E>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                warn!("{} failed for '{}': {}", what, name, e);
                None
            }
            Err(_) => {
                warn!("{} timed out for '{}' after {:?}", what, name, self.timeout);
                None
            }
        }
    }
}
