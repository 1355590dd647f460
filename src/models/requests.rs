use crate::error::ApiError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

// Fields default so that missing ones reach `validate` and produce the
// JSON error body instead of the extractor's plain-text rejection.

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TripRequest {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let has_interest = self.interests.iter().any(|i| !i.trim().is_empty());
        if self.city.trim().is_empty() || self.budget.trim().is_empty() || !has_interest {
            return Err(ApiError::Validation("Missing fields".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SuggestPlacesRequest {
    #[serde(default)]
    pub message: String,
}

impl SuggestPlacesRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::Validation("Missing message".to_string()));
        }
        Ok(())
    }

    /// City named in the message ("... in Lisbon"), empty when there is none.
    pub fn city(&self) -> String {
        static CITY: OnceLock<Regex> = OnceLock::new();
        let pattern = CITY.get_or_init(|| Regex::new(r"(?i)\bin ([A-Za-z ]+)").expect("valid city regex"));

        pattern
            .captures(&self.message)
            .and_then(|captures| captures.get(1))
            .map(|city| city.as_str().trim().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectedPlace {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerateItineraryRequest {
    #[serde(default)]
    pub places: Vec<SelectedPlace>,
}

impl GenerateItineraryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.place_names().is_empty() {
            return Err(ApiError::Validation("No places provided".to_string()));
        }
        Ok(())
    }

    pub fn place_names(&self) -> Vec<String> {
        self.places
            .iter()
            .map(|place| place.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub itinerary: Value,
}

impl QuestionRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.question.trim().is_empty() || self.itinerary.is_null() {
            return Err(ApiError::Validation(
                "Missing question or itinerary".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetailsQuery {
    pub place: Option<String>,
    pub city: Option<String>,
}

impl PlaceDetailsQuery {
    pub fn validate(&self) -> Result<(&str, &str), ApiError> {
        match (non_empty(&self.place), non_empty(&self.city)) {
            (Some(place), Some(city)) => Ok((place, city)),
            _ => Err(ApiError::Validation("Missing place or city".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionsQuery {
    pub city: Option<String>,
    pub weather: Option<String>,
}

impl SuggestionsQuery {
    pub fn validate(&self) -> Result<(&str, &str), ApiError> {
        match (non_empty(&self.city), non_empty(&self.weather)) {
            (Some(city), Some(weather)) => Ok((city, weather)),
            _ => Err(ApiError::Validation(
                "city and weather required".to_string(),
            )),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trip_request_requires_all_fields() {
        let valid: TripRequest = serde_json::from_value(json!({
            "city": "Paris", "budget": "$500", "interests": ["art"]
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let missing: TripRequest = serde_json::from_value(json!({ "city": "Paris" })).unwrap();
        assert!(matches!(missing.validate(), Err(ApiError::Validation(_))));

        let blank = TripRequest {
            city: "Paris".into(),
            budget: "$500".into(),
            interests: vec!["  ".into()],
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_city_is_inferred_from_message() {
        let request = SuggestPlacesRequest {
            message: "Best museums in Lisbon".into(),
        };
        assert_eq!(request.city(), "Lisbon");

        let request = SuggestPlacesRequest {
            message: "Somewhere warm please".into(),
        };
        assert_eq!(request.city(), "");
    }

    #[test]
    fn test_place_names_skip_blanks() {
        let request: GenerateItineraryRequest = serde_json::from_value(json!({
            "places": [{ "name": "Louvre" }, { "name": " " }, { "rating": 4 }]
        }))
        .unwrap();

        assert_eq!(request.place_names(), vec!["Louvre"]);
        assert!(request.validate().is_ok());
        assert!(GenerateItineraryRequest::default().validate().is_err());
    }

    #[test]
    fn test_question_requires_itinerary() {
        let request: QuestionRequest =
            serde_json::from_value(json!({ "question": "When?" })).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_query_validation() {
        let query = PlaceDetailsQuery {
            place: Some("Louvre".into()),
            city: Some(" ".into()),
        };
        assert!(query.validate().is_err());

        let query = SuggestionsQuery {
            city: Some("Paris".into()),
            weather: Some("rainy".into()),
        };
        assert_eq!(query.validate().unwrap(), ("Paris", "rainy"));
    }
}
