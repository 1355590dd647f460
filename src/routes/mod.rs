use crate::error::ApiError;
use actix_web::web;

pub mod health;
pub mod itinerary;
pub mod places;
pub mod qa;
pub mod suggestions;

/// Register every route. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health_check))
    .service(
        web::scope("/api")
            .route("/itinerary", web::post().to(itinerary::plan))
            .route(
                "/generate-itinerary",
                web::post().to(itinerary::generate_from_places),
            )
            .route("/suggest-places", web::post().to(places::suggest_places))
            .route("/place-details", web::get().to(places::place_details))
            .route("/qa", web::post().to(qa::answer))
            .route("/suggestions", web::get().to(suggestions::get_suggestions)),
    );
}
