use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Fields the place-enrichment provider knows about a place.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub rating: Option<f64>,
    pub image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_review_texts")]
    pub reviews: Option<Vec<String>>,
    pub address: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Response body of the place-details endpoint.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub reviews: Vec<String>,
    pub images: Vec<String>,
}

impl PlaceDetails {
    pub fn from_info(info: Option<PlaceInfo>) -> Self {
        let info = info.unwrap_or_default();
        Self {
            reviews: dedup_preserving_order(info.reviews.unwrap_or_default()),
            images: dedup_preserving_order(info.image.into_iter().collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSuggestion {
    pub store: String,
    pub product: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Weather {
    Rainy,
    Sunny,
    Other(String),
}

impl Weather {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "rainy" => Weather::Rainy,
            "sunny" => Weather::Sunny,
            other => Weather::Other(other.to_string()),
        }
    }

    /// Product categories worth suggesting for this weather
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            Weather::Rainy => &["clothes", "gear"],
            Weather::Sunny => &["clothes", "food"],
            Weather::Other(_) => &[],
        }
    }
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

// Providers report reviews either as plain strings, as objects with a
// snippet, or only as a count. Only text is kept.
pub(crate) fn deserialize_review_texts<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let texts: Vec<String> = match value {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                item.as_str()
                    .or_else(|| item.get("snippet").and_then(|s| s.as_str()))
                    .map(str::to_owned)
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(if texts.is_empty() { None } else { Some(texts) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reviews_accept_strings_and_snippets() {
        let info: PlaceInfo = serde_json::from_value(json!({
            "rating": 4.5,
            "reviews": ["Great view", {"snippet": "Long queue"}, {"rating": 5}]
        }))
        .unwrap();

        assert_eq!(
            info.reviews,
            Some(vec!["Great view".to_string(), "Long queue".to_string()])
        );
    }

    #[test]
    fn test_review_count_is_dropped() {
        let info: PlaceInfo = serde_json::from_value(json!({ "reviews": 1234 })).unwrap();
        assert_eq!(info.reviews, None);
    }

    #[test]
    fn test_place_details_deduplicates() {
        let details = PlaceDetails::from_info(Some(PlaceInfo {
            reviews: Some(vec!["a".into(), "b".into(), "a".into()]),
            image: Some("https://img/1.jpg".into()),
            ..Default::default()
        }));

        assert_eq!(details.reviews, vec!["a", "b"]);
        assert_eq!(details.images, vec!["https://img/1.jpg"]);
        assert_eq!(PlaceDetails::from_info(None), PlaceDetails::default());
    }

    #[test]
    fn test_weather_categories() {
        assert_eq!(Weather::parse("Rainy").categories(), &["clothes", "gear"]);
        assert_eq!(Weather::parse("sunny").categories(), &["clothes", "food"]);
        assert!(Weather::parse("foggy").categories().is_empty());
    }
}
