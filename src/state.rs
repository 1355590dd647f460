use crate::config::AppConfig;
use crate::services::{
    completion_service::{CompletionProvider, GroqClient},
    enrichment_service::EnrichmentService,
    geocoding_service::{Geocoder, NominatimClient},
    graph_service::{GraphStore, Neo4jHttpStore, QueryLogger},
    place_service::{PlaceEnrichmentProvider, SerpApiClient},
};
use log::{info, warn};
use std::sync::Arc;

/// Shared by every worker; nothing in here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<dyn CompletionProvider>,
    pub enrichment: EnrichmentService,
    pub graph: Option<Arc<dyn GraphStore>>,
    pub query_log: QueryLogger,
}

impl AppState {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        enrichment: EnrichmentService,
        graph: Option<Arc<dyn GraphStore>>,
    ) -> Self {
        Self {
            completion,
            enrichment,
            query_log: QueryLogger::new(graph.clone()),
            graph,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let completion: Arc<dyn CompletionProvider> = Arc::new(GroqClient::new(&config.completion)?);

        let places: Option<Arc<dyn PlaceEnrichmentProvider>> = match &config.serp {
            Some(serp) => {
                info!("Place enrichment enabled (SerpAPI)");
                Some(Arc::new(SerpApiClient::new(serp)?))
            }
            None => {
                warn!("SERP_API_KEY not set, place enrichment disabled");
                None
            }
        };

        let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimClient::new(&config.nominatim)?);

        let graph: Option<Arc<dyn GraphStore>> = match &config.graph {
            Some(graph) => {
                info!("Graph store enabled at {}", graph.uri);
                Some(Arc::new(Neo4jHttpStore::new(graph)?))
            }
            None => {
                warn!("NEO4J_PASSWORD not set, query logging disabled");
                None
            }
        };

        let enrichment = EnrichmentService::new(places, Some(geocoder), &config.enrichment);

        Ok(Self::new(completion, enrichment, graph))
    }
}
