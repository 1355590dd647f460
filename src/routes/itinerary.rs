use crate::{
    error::ApiError,
    models::{
        prompt::PromptContext,
        requests::{GenerateItineraryRequest, TripRequest},
        responses::ItineraryResponse,
    },
    services::{
        extraction::{extract, DocumentShape},
        graph_service::QueryLogEntry,
    },
    state::AppState,
};
use actix_web::{web, HttpResponse};
use log::info;
use uuid::Uuid;

/*
    /api/itinerary
*/
pub async fn plan(
    state: web::Data<AppState>,
    body: web::Json<TripRequest>,
) -> Result<HttpResponse, ApiError> {
    let trip = body.into_inner();
    trip.validate()?;

    let request_id = Uuid::new_v4();
    let city = trip.city.trim();
    info!("[{}] Planning itinerary for {}", request_id, city);

    let prompt = PromptContext::trip(&trip.city, &trip.budget, &trip.interests).render();
    let raw = state.completion.complete(&prompt).await?;

    let mut itinerary = extract(&raw, DocumentShape::Object)?.document;
    state.enrichment.enrich_itinerary(&mut itinerary, city).await;
    info!("[{}] Itinerary enriched for {}", request_id, city);

    state
        .query_log
        .record(QueryLogEntry::new(&trip.city, &trip.budget, &trip.interests));

    Ok(HttpResponse::Ok().json(ItineraryResponse { itinerary }))
}

/*
    /api/generate-itinerary
*/
pub async fn generate_from_places(
    state: web::Data<AppState>,
    body: web::Json<GenerateItineraryRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    request.validate()?;

    let names = request.place_names();
    info!("Generating itinerary from {} selected places", names.len());

    let prompt = PromptContext::selected_places(&names).render();
    let raw = state.completion.complete(&prompt).await?;
    let extracted = extract(&raw, DocumentShape::Object)?;

    Ok(HttpResponse::Ok().json(ItineraryResponse {
        itinerary: extracted.document,
    }))
}
