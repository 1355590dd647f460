use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

impl ServiceStatus {
    fn new(status: &str, details: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            details: Some(details.into()),
        }
    }
}

/*
    /health
*/
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // Completion calls cost tokens, so only configuration is reported
    health.services.insert(
        "completion".to_string(),
        ServiceStatus::new("ok", "Completion provider configured"),
    );

    let place_enrichment = if state.enrichment.has_place_provider() {
        ServiceStatus::new("ok", "Place enrichment provider configured")
    } else {
        ServiceStatus::new("disabled", "SERP_API_KEY not configured")
    };
    health
        .services
        .insert("place_enrichment".to_string(), place_enrichment);

    let graph_store = check_graph_store(&state).await;
    health
        .services
        .insert("graph_store".to_string(), graph_store);

    if health.services.values().any(|service| service.status == "error") {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_graph_store(state: &AppState) -> ServiceStatus {
    let Some(graph) = &state.graph else {
        return ServiceStatus::new("disabled", "NEO4J_PASSWORD not configured");
    };

    match graph.ping().await {
        Ok(()) => ServiceStatus::new("ok", "Connected successfully to graph store"),
        Err(e) => {
            error!("Graph store health check failed: {}", e);
            ServiceStatus::new("error", format!("Failed to connect: {}", e))
        }
    }
}
