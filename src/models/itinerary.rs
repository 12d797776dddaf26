use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Model output
//
// Everything is optional: the language model is free to drop fields, write
// `null`, or use the wrong scalar type, and the enricher substitutes defaults.
// ============================================================================

/// Itinerary as synthesized by the language model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default, deserialize_with = "lenient_string")]
    pub destination: Option<String>,
    #[serde(default, alias = "duration_days", deserialize_with = "lenient_u32")]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default, alias = "day_number", deserialize_with = "lenient_u32")]
    pub day: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub theme: Option<String>,
    #[serde(default, alias = "items", deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_location")]
    pub location: Option<ActivityLocation>,
    /// Some model outputs name the place here instead of in `location`
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cultural_connection: Option<String>,
}

/// The model writes a location either as a bare string or as an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityLocation {
    Name(String),
    Detailed {
        #[serde(default, deserialize_with = "lenient_string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        address: Option<String>,
    },
}

impl Activity {
    /// Best available place name, ignoring blank values
    pub fn place_name(&self) -> Option<&str> {
        let from_location = match &self.location {
            Some(ActivityLocation::Name(name)) => Some(name.as_str()),
            Some(ActivityLocation::Detailed { name, .. }) => name.as_deref(),
            None => None,
        };

        from_location
            .filter(|name| !name.trim().is_empty())
            .or(self.name.as_deref().filter(|name| !name.trim().is_empty()))
            .map(str::trim)
    }
}

/// Accepts `2`, `2.0` and `"2"`. Anything else, including zero, is `None`.
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    Ok(number
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0))
}

/// Strings pass through, numbers and booleans are rendered as text, and
/// anything else is `None`
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// `null` reads as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A location of an unexpected shape is treated as absent
fn lenient_location<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

// ============================================================================
// Enriched response
// ============================================================================

/// Itinerary returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    pub destination: String,
    pub duration_days: u32,
    pub travel_image: String,
    pub summary: String,
    pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    pub day_number: u32,
    pub theme: String,
    pub activities: Vec<PlanActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanActivity {
    pub time: String,
    pub location: Location,
    pub category: String,
    pub description: String,
    pub cultural_connection: String,
    pub category_icon: String,
}

/// Display location with a link that opens in Google Maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub address: String,
    pub maps_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}
