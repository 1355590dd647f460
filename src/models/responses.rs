use crate::models::place::StoreSuggestion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct ItineraryResponse {
    pub itinerary: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlacesResponse {
    pub places: Vec<Value>,
    /// Raw completion text, kept for the chat transcript.
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<StoreSuggestion>,
}
