use serde::Deserialize;

use crate::{
    models::{
        itinerary::{lenient_string, lenient_u32},
        TastePreferences, TripParameters,
    },
    services::{
        json_extract::extract_json_object,
        providers::{GenerationOptions, LanguageModel},
    },
};

pub const DEFAULT_MUSIC: &str = "Pop";
pub const DEFAULT_MOVIE: &str = "Anime";
pub const DEFAULT_FASHION: &str = "Streetwear";
pub const DEFAULT_DESTINATION: &str = "Tokyo";
pub const DEFAULT_DAYS: u32 = 2;
pub const MAX_DAYS: u32 = 14;

const PARSE_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.0,
    max_output_tokens: 256,
    thinking_budget: Some(0),
};

#[derive(Debug, Default, Deserialize)]
struct ParsedTrip {
    #[serde(default, deserialize_with = "lenient_string")]
    music: Option<String>,
    #[serde(default, alias = "film", deserialize_with = "lenient_string")]
    movie: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    fashion: Option<String>,
    #[serde(default, alias = "city", deserialize_with = "lenient_string")]
    destination: Option<String>,
    #[serde(default, alias = "duration", deserialize_with = "lenient_u32")]
    days: Option<u32>,
}

fn non_blank(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl From<ParsedTrip> for TripParameters {
    fn from(parsed: ParsedTrip) -> Self {
        TripParameters {
            preferences: TastePreferences {
                music: non_blank(parsed.music, DEFAULT_MUSIC),
                movie: non_blank(parsed.movie, DEFAULT_MOVIE),
                fashion: non_blank(parsed.fashion, DEFAULT_FASHION),
            },
            destination: non_blank(parsed.destination, DEFAULT_DESTINATION),
            days: parsed.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS),
        }
    }
}

fn build_parse_prompt(user_input: &str) -> String {
    format!(
        r#"Extract travel preferences from the message below.

Message: "{user_input}"

Reply with only a JSON object of this shape:
{{"music": "<favourite artist or genre>", "movie": "<favourite film, studio or genre>", "fashion": "<favourite brand or style>", "destination": "<city>", "days": <number of days>}}

Use null for anything the message does not mention."#
    )
}

/// Infers trip parameters from free text
///
/// Never fails: anything the model does not supply, or any failure of the
/// model call itself, falls back to the defaults field by field.
pub async fn parse_trip_parameters(model: &dyn LanguageModel, user_input: &str) -> TripParameters {
    let prompt = build_parse_prompt(user_input);

    let parsed = match model.complete(&prompt, &PARSE_OPTIONS).await {
        Ok(raw) => parse_model_reply(&raw),
        Err(e) => {
            tracing::warn!(error = %e, provider = model.name(), "Trip parameter extraction failed");
            ParsedTrip::default()
        }
    };

    let params = TripParameters::from(parsed);
    tracing::info!(
        music = %params.preferences.music,
        movie = %params.preferences.movie,
        fashion = %params.preferences.fashion,
        destination = %params.destination,
        days = params.days,
        "Trip parameters inferred"
    );
    params
}

fn parse_model_reply(raw: &str) -> ParsedTrip {
    let json = match extract_json_object(raw) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "No JSON in trip parameter reply");
            return ParsedTrip::default();
        }
    };

    serde_json::from_str(json).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unparseable trip parameter reply");
        ParsedTrip::default()
    })
}
