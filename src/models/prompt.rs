use serde_json::Value;

const ITINERARY_FORMAT: &str = r#"For each activity, return a structured JSON with:
- location (string)
- best_time_to_visit (string)
- cost (number)
- highlights (string)
- image (string, URL to a photo if possible)
Respond ONLY with a valid JSON object, no extra text, no markdown, no code fences, no explanation.
Format the response as:
{
  "itinerary": [
    {
      "day": 1,
      "activities": [
        {
          "location": "...",
          "best_time_to_visit": "...",
          "cost": 0,
          "highlights": "...",
          "image": "..."
        }
      ]
    }
  ]
}"#;

/// What the completion provider is asked, built once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptContext {
    Trip {
        city: String,
        budget: String,
        interests: Vec<String>,
    },
    Raw(String),
}

impl PromptContext {
    pub fn trip(city: &str, budget: &str, interests: &[String]) -> Self {
        PromptContext::Trip {
            city: city.trim().to_string(),
            budget: budget.trim().to_string(),
            interests: interests.to_vec(),
        }
    }

    /// Ask for must-visit places based on a free-text chat message.
    pub fn place_suggestions(message: &str) -> Self {
        PromptContext::Raw(format!(
            r#"Suggest 8 must-visit places in a city based on this user input: "{}". For each, provide:
- name (string)
- description (string)
- rating (number, 1-5)
- image (string, URL to a photo if possible)
- cost (string, e.g. $, $$, $$$)
- info (string, 1-2 sentences with highlights or tips)
- lat (number, if available)
- lon (number, if available)
Respond ONLY with a valid JSON array, no extra text, no markdown, no code fences, no explanation. The array must be valid JSON."#,
            message.trim()
        ))
    }

    /// Ask for a day-by-day plan covering places the user picked.
    pub fn selected_places(names: &[String]) -> Self {
        PromptContext::Raw(format!(
            "You are an AI travel agent. Create a 3-day itinerary for a trip including these places: {}.\n{}",
            names.join(", "),
            ITINERARY_FORMAT
        ))
    }

    pub fn question(itinerary: &Value, question: &str) -> Self {
        PromptContext::Raw(format!(
            "Given this itinerary: {}\nAnswer this question: {}",
            itinerary,
            question.trim()
        ))
    }

    pub fn render(&self) -> String {
        match self {
            PromptContext::Trip {
                city,
                budget,
                interests,
            } => format!(
                "You are an AI travel agent. Suggest a personalized itinerary for a trip to {} with a budget of {} and interests: {}.\n{}",
                city,
                budget,
                interests.join(", "),
                ITINERARY_FORMAT
            ),
            PromptContext::Raw(prompt) => prompt.clone(),
        }
    }
}
