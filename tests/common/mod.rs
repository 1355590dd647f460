#![allow(dead_code)]

use actix_web::{middleware::Logger, web, App};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wayfarer_api::config::EnrichmentConfig;
use wayfarer_api::models::place::{Coordinates, PlaceInfo, StoreSuggestion, Weather};
use wayfarer_api::routes;
use wayfarer_api::services::completion_service::{CompletionError, CompletionProvider};
use wayfarer_api::services::enrichment_service::EnrichmentService;
use wayfarer_api::services::geocoding_service::{Geocoder, GeocodingError};
use wayfarer_api::services::graph_service::{GraphStore, GraphStoreError, QueryLogEntry};
use wayfarer_api::services::place_service::{PlaceEnrichmentProvider, PlaceLookupError};
use wayfarer_api::state::AppState;

/// Completion provider that answers every prompt with the same text, or fails.
pub struct FakeCompletion {
    reply: Result<String, u16>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeCompletion {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for FakeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(CompletionError::Status {
                status: *status,
                body: "upstream unavailable".to_string(),
            }),
        }
    }
}

/// Place provider backed by a map. Names in `failing` return an error, names
/// in `slow` never answer within any sensible deadline. Every lookup takes at
/// least `delay`, and the highest number of lookups running at once is kept.
#[derive(Default)]
pub struct FakePlaces {
    known: HashMap<String, PlaceInfo>,
    failing: Vec<String>,
    slow: Vec<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakePlaces {
    pub fn with(mut self, name: &str, info: PlaceInfo) -> Self {
        self.known.insert(name.to_string(), info);
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn slow_on(mut self, name: &str) -> Self {
        self.slow.push(name.to_string());
        self
    }

    pub fn taking(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceEnrichmentProvider for FakePlaces {
    async fn lookup(&self, place: &str, city: &str) -> Result<Option<PlaceInfo>, PlaceLookupError> {
        self.calls
            .lock()
            .unwrap()
            .push((place.to_string(), city.to_string()));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.slow.iter().any(|name| name == place) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.failing.iter().any(|name| name == place) {
            return Err(PlaceLookupError::ResponseError("quota exceeded".to_string()));
        }
        Ok(self.known.get(place).cloned())
    }
}

#[derive(Default)]
pub struct FakeGeocoder {
    known: HashMap<String, Coordinates>,
}

impl FakeGeocoder {
    pub fn with(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.known.insert(name.to_string(), Coordinates { lat, lon });
        self
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, place: &str, _city: &str) -> Result<Option<Coordinates>, GeocodingError> {
        Ok(self.known.get(place).copied())
    }
}

#[derive(Default)]
pub struct FakeGraph {
    fail: bool,
    suggestions: Vec<StoreSuggestion>,
    pub logged: Mutex<Vec<QueryLogEntry>>,
    pub suggestion_requests: Mutex<Vec<(String, Weather)>>,
}

impl FakeGraph {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_suggestions(suggestions: Vec<StoreSuggestion>) -> Self {
        Self {
            suggestions,
            ..Default::default()
        }
    }

    pub fn logged(&self) -> Vec<QueryLogEntry> {
        self.logged.lock().unwrap().clone()
    }

    fn outage(&self) -> GraphStoreError {
        GraphStoreError::ResponseError("connection refused".to_string())
    }
}

#[async_trait]
impl GraphStore for FakeGraph {
    async fn log_query(&self, entry: &QueryLogEntry) -> Result<(), GraphStoreError> {
        if self.fail {
            return Err(self.outage());
        }
        self.logged.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn store_suggestions(
        &self,
        city: &str,
        weather: &Weather,
    ) -> Result<Vec<StoreSuggestion>, GraphStoreError> {
        self.suggestion_requests
            .lock()
            .unwrap()
            .push((city.to_string(), weather.clone()));
        if self.fail {
            return Err(self.outage());
        }
        Ok(self.suggestions.clone())
    }

    async fn ping(&self) -> Result<(), GraphStoreError> {
        if self.fail {
            Err(self.outage())
        } else {
            Ok(())
        }
    }
}

pub struct TestApp {
    pub completion: Arc<FakeCompletion>,
    pub places: Option<Arc<FakePlaces>>,
    pub geocoder: Option<Arc<FakeGeocoder>>,
    pub graph: Option<Arc<FakeGraph>>,
    pub enrichment: EnrichmentConfig,
}

impl TestApp {
    pub fn new(completion: FakeCompletion) -> Self {
        Self {
            completion: Arc::new(completion),
            places: None,
            geocoder: None,
            graph: None,
            enrichment: EnrichmentConfig::default(),
        }
    }

    pub fn with_places(mut self, places: FakePlaces) -> Self {
        self.places = Some(Arc::new(places));
        self
    }

    pub fn with_geocoder(mut self, geocoder: FakeGeocoder) -> Self {
        self.geocoder = Some(Arc::new(geocoder));
        self
    }

    pub fn with_graph(mut self, graph: FakeGraph) -> Self {
        self.graph = Some(Arc::new(graph));
        self
    }

    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment.timeout = timeout;
        self
    }

    pub fn with_enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.enrichment.concurrency = concurrency;
        self
    }

    pub fn state(&self) -> AppState {
        let places = self
            .places
            .clone()
            .map(|places| places as Arc<dyn PlaceEnrichmentProvider>);
        let geocoder = self
            .geocoder
            .clone()
            .map(|geocoder| geocoder as Arc<dyn Geocoder>);
        let graph = self.graph.clone().map(|graph| graph as Arc<dyn GraphStore>);

        AppState::new(
            self.completion.clone(),
            EnrichmentService::new(places, geocoder, &self.enrichment),
            graph,
        )
    }

    pub fn create_app(&self) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(self.state()))
            .configure(routes::configure)
    }
}

/// Let detached tasks (query logging) run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
