use crate::{
    error::{AppError, AppResult},
    models::{Itinerary, Recommendations, TasteCategory},
    services::{
        json_extract::{extract_json_object, truncate_chars},
        providers::{GenerationOptions, LanguageModel},
    },
};

/// Characters of model output kept for diagnostics
pub const RAW_EXCERPT_CHARS: usize = 300;

/// Activities requested per day
pub const ACTIVITIES_PER_DAY: usize = 6;

/// The model produced text, but no usable itinerary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// No brace-delimited object in the output
    NoJson { raw_excerpt: String },
    /// An object was found but did not parse
    InvalidJson { reason: String, raw_excerpt: String },
}

impl From<ParseFailure> for AppError {
    fn from(failure: ParseFailure) -> Self {
        match failure {
            ParseFailure::NoJson { raw_excerpt } => AppError::ModelOutput {
                reason: "No valid JSON found".to_string(),
                raw_response: raw_excerpt,
            },
            ParseFailure::InvalidJson {
                reason,
                raw_excerpt,
            } => AppError::ModelOutput {
                reason: format!("JSON parse failed: {}", reason),
                raw_response: raw_excerpt,
            },
        }
    }
}

pub fn build_itinerary_prompt(
    user_input: &str,
    recommendations: &Recommendations,
    destination: &str,
    days: u32,
) -> String {
    let tastes: String = TasteCategory::ALL
        .iter()
        .map(|category| {
            format!(
                "- {}: {}\n",
                category.label(),
                recommendations.get(*category).join(", ")
            )
        })
        .collect();

    format!(
        r#"User said: "{user_input}"
Plan a {days}-day cultural itinerary in {destination}.

Tastes:
{tastes}
Include {ACTIVITIES_PER_DAY} activities per day covering music, film, fashion, dining (lunch and dinner) and one hidden gem.
Tie every activity back to the tastes above in "cultural_connection".
Use only these category values: music, film, fashion, dining, hidden_gem.

Output valid JSON only, with this shape:
{{
  "destination": "{destination}",
  "duration": {days},
  "days": [
    {{
      "day": 1,
      "theme": "<short theme>",
      "activities": [
        {{
          "time": "9:00 AM",
          "location": "<real place name>",
          "category": "music",
          "description": "<what to do there>",
          "cultural_connection": "<how it relates to the user's tastes>"
        }}
      ]
    }}
  ]
}}
"#
    )
}

/// Parses raw model output into an itinerary
///
/// Accepts the object bare or wrapped as `{"itinerary": {...}}`.
pub fn parse_itinerary(raw: &str) -> Result<Itinerary, ParseFailure> {
    let json = extract_json_object(raw).map_err(|_| ParseFailure::NoJson {
        raw_excerpt: truncate_chars(raw, RAW_EXCERPT_CHARS),
    })?;

    let invalid = |reason: String| ParseFailure::InvalidJson {
        reason,
        raw_excerpt: truncate_chars(json, RAW_EXCERPT_CHARS),
    };

    let mut value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;

    if let Some(inner) = value
        .get_mut("itinerary")
        .filter(|inner| inner.is_object())
        .map(serde_json::Value::take)
    {
        value = inner;
    }

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Generates an itinerary with the language model
///
/// Transport failures propagate as errors; unusable output comes back as a
/// `ModelOutput` error carrying a truncated excerpt. There is no retry.
pub async fn synthesize(
    model: &dyn LanguageModel,
    options: &GenerationOptions,
    user_input: &str,
    recommendations: &Recommendations,
    destination: &str,
    days: u32,
) -> AppResult<Itinerary> {
    let prompt = build_itinerary_prompt(user_input, recommendations, destination, days);
    let raw = model.complete(&prompt, options).await?;

    let itinerary = parse_itinerary(&raw).map_err(|failure| {
        tracing::warn!(failure = ?failure, provider = model.name(), "Model output unusable");
        AppError::from(failure)
    })?;

    tracing::info!(
        destination = %destination,
        days = itinerary.days.len(),
        activities = itinerary.days.iter().map(|d| d.activities.len()).sum::<usize>(),
        "Itinerary synthesized"
    );

    Ok(itinerary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockLanguageModel;

    const OPTIONS: GenerationOptions = GenerationOptions {
        temperature: 0.7,
        max_output_tokens: 8192,
        thinking_budget: None,
    };

    fn recommendations() -> Recommendations {
        Recommendations {
            music: vec!["SEVENTEEN".to_string(), "TXT".to_string()],
            movie: vec!["Spirited Away".to_string()],
            fashion: vec!["Streetwear".to_string()],
        }
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_itinerary_prompt("I love BTS", &recommendations(), "Tokyo", 2);
        assert!(prompt.contains("User said: \"I love BTS\""));
        assert!(prompt.contains("Plan a 2-day cultural itinerary in Tokyo."));
        assert!(prompt.contains("- Music: SEVENTEEN, TXT"));
        assert!(prompt.contains("- Film: Spirited Away"));
        assert!(prompt.contains("- Fashion: Streetwear"));
        assert!(prompt.contains("\"cultural_connection\""));
        assert!(prompt.contains("\"destination\": \"Tokyo\""));
    }

    #[test]
    fn test_parse_bare_object() {
        let raw = r#"{"destination": "Tokyo", "duration": 1, "days": [{"day": 1, "activities": []}]}"#;
        let itinerary = parse_itinerary(raw).unwrap();
        assert_eq!(itinerary.destination.as_deref(), Some("Tokyo"));
        assert_eq!(itinerary.days.len(), 1);
    }

    #[test]
    fn test_parse_wrapped_object_in_prose() {
        let raw = "Here you go!\n```json\n{\"itinerary\": {\"destination\": \"Kyoto\", \"duration\": 2, \"days\": []}}\n```";
        let itinerary = parse_itinerary(raw).unwrap();
        assert_eq!(itinerary.destination.as_deref(), Some("Kyoto"));
        assert_eq!(itinerary.duration, Some(2));
    }

    #[test]
    fn test_no_json_excerpt_is_truncated() {
        let raw = "x".repeat(1000);
        match parse_itinerary(&raw) {
            Err(ParseFailure::NoJson { raw_excerpt }) => assert_eq!(raw_excerpt.len(), 300),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json() {
        let failure = parse_itinerary("{\"days\": [1, 2,]}").unwrap_err();
        match &failure {
            ParseFailure::InvalidJson { raw_excerpt, .. } => {
                assert_eq!(raw_excerpt, "{\"days\": [1, 2,]}")
            }
            other => panic!("unexpected failure: {:?}", other),
        }

        let err = AppError::from(failure);
        assert!(err.to_string().starts_with("JSON parse failed: "));
    }

    #[test]
    fn test_nulls_and_odd_scalars_still_parse() {
        let itinerary = parse_itinerary(r#"{"days": [{"day": 1, "activities": null}]}"#).unwrap();
        assert!(itinerary.days[0].activities.is_empty());

        let itinerary = parse_itinerary(r#"{"days": null}"#).unwrap();
        assert!(itinerary.days.is_empty());

        let itinerary =
            parse_itinerary(r#"{"days": [{"activities": [{"time": 9, "location": "Namsan"}]}]}"#)
                .unwrap();
        assert_eq!(itinerary.days[0].activities[0].time.as_deref(), Some("9"));
    }

    #[test]
    fn test_wrong_shape_is_invalid_json() {
        let failure = parse_itinerary(r#"{"days": "none"}"#).unwrap_err();
        assert!(matches!(failure, ParseFailure::InvalidJson { .. }));
    }

    #[tokio::test]
    async fn test_synthesize_passes_options_and_parses() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_complete()
            .times(1)
            .returning(|prompt, options| {
                assert!(prompt.contains("Kyoto"));
                assert_eq!(options.max_output_tokens, 8192);
                Ok(r#"{"destination": "Kyoto", "duration": 1, "days": [{"day": 1, "theme": "Temples", "activities": [{"location": "Kinkaku-ji"}]}]}"#.to_string())
            });

        let itinerary = synthesize(&mock, &OPTIONS, "temples", &recommendations(), "Kyoto", 1)
            .await
            .unwrap();
        assert_eq!(itinerary.days[0].theme.as_deref(), Some("Temples"));
    }

    #[tokio::test]
    async fn test_synthesize_prose_is_model_output_error() {
        let mut mock = MockLanguageModel::new();
        mock.expect_name().return_const("mock");
        mock.expect_complete()
            .returning(|_, _| Ok("I cannot produce JSON today.".to_string()));

        let err = synthesize(&mock, &OPTIONS, "hi", &recommendations(), "Tokyo", 2)
            .await
            .unwrap_err();
        match err {
            AppError::ModelOutput {
                reason,
                raw_response,
            } => {
                assert_eq!(reason, "No valid JSON found");
                assert_eq!(raw_response, "I cannot produce JSON today.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
