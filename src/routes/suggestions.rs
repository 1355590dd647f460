use crate::{
    error::ApiError,
    models::{place::Weather, requests::SuggestionsQuery, responses::SuggestionsResponse},
    state::AppState,
};
use actix_web::{web, HttpResponse};
use log::{debug, error};

/*
    /api/suggestions?city=...&weather=...
*/
pub async fn get_suggestions(
    state: web::Data<AppState>,
    query: web::Query<SuggestionsQuery>,
) -> Result<HttpResponse, ApiError> {
    let (city, weather) = query.validate()?;

    let graph = state
        .graph
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Graph store is not configured".to_string()))?;

    let weather = Weather::parse(weather);
    let suggestions = graph
        .store_suggestions(city, &weather)
        .await
        .map_err(|e| {
            error!("Failed to load store suggestions for {}: {}", city, e);
            ApiError::from(e)
        })?;
    debug!("{} store suggestions for {}", suggestions.len(), city);

    Ok(HttpResponse::Ok().json(SuggestionsResponse { suggestions }))
}
