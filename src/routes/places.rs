use crate::{
    error::ApiError,
    models::{
        place::PlaceDetails,
        prompt::PromptContext,
        requests::{PlaceDetailsQuery, SuggestPlacesRequest},
        responses::PlacesResponse,
    },
    services::extraction::{extract, DocumentShape},
    state::AppState,
};
use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde_json::Value;

/*
    /api/suggest-places
*/
pub async fn suggest_places(
    state: web::Data<AppState>,
    body: web::Json<SuggestPlacesRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    request.validate()?;

    let city = request.city();
    info!("Suggesting places for {:?}", city);

    let prompt = PromptContext::place_suggestions(&request.message).render();
    let raw = state.completion.complete(&prompt).await?;

    let extracted = extract(&raw, DocumentShape::Array)?;
    let mut places = match extracted.document {
        Value::Array(places) if !places.is_empty() => places,
        _ => {
            warn!("Completion provider suggested no places");
            return Err(ApiError::EmptyResult {
                message: "No places found in AI response".to_string(),
                raw,
            });
        }
    };

    state.enrichment.enrich_places(&mut places, &city).await;

    Ok(HttpResponse::Ok().json(PlacesResponse {
        places,
        response: raw,
    }))
}

/*
    /api/place-details?place=...&city=...
*/
pub async fn place_details(
    state: web::Data<AppState>,
    query: web::Query<PlaceDetailsQuery>,
) -> Result<HttpResponse, ApiError> {
    let (place, city) = query.validate()?;

    let info = state.enrichment.place_info(place, city).await;
    if info.is_none() {
        info!("No place details found for '{}' in {}", place, city);
    }

    Ok(HttpResponse::Ok().json(PlaceDetails::from_info(info)))
}
