use std::sync::Arc;

use chrono::{Duration, NaiveTime};
use futures::future::join_all;

use crate::{
    models::{Activity, Day, Itinerary, Location, PlanActivity, PlanDay, TravelPlan},
    services::providers::PlaceProvider,
};

pub const MAPS_SEARCH_PREFIX: &str = "https://www.google.com/maps/search/";

const DEFAULT_SCHEDULE: [&str; 6] = [
    "9:00 AM", "11:00 AM", "1:00 PM", "3:00 PM", "6:00 PM", "8:00 PM",
];

/// Hour of the last default slot; later positions step forward from here
const LAST_SLOT_HOUR: u32 = 20;
const OVERFLOW_STEP_HOURS: i64 = 1;

const PLACEHOLDER_TIMES: [&str; 6] = ["", "tbd", "n/a", "time", "hh:mm", "--"];

const UNKNOWN_LOCATION: &str = "Unknown";
const DEFAULT_CATEGORY: &str = "general";
const DEFAULT_THEME: &str = "Cultural day";
const DEFAULT_ICON: &str = "📍";

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Location record built without any network call
pub fn static_location(name: &str, destination: &str) -> Location {
    let address = format!("{}, {}", name, destination);
    Location {
        name: name.to_string(),
        maps_link: format!("{}{}", MAPS_SEARCH_PREFIX, encode(&address)),
        address,
        place_id: None,
    }
}

fn place_link(query: &str, place_id: Option<&str>) -> String {
    match place_id {
        Some(id) => format!(
            "{}?api=1&query={}&query_place_id={}",
            MAPS_SEARCH_PREFIX,
            encode(query),
            encode(id)
        ),
        None => format!("{}?api=1&query={}", MAPS_SEARCH_PREFIX, encode(query)),
    }
}

/// Cover image for a destination; plain string formatting
pub fn travel_image(destination: &str) -> String {
    format!("https://picsum.photos/seed/{}/1200/800", encode(destination))
}

/// Maps loose category labels onto the fixed icon table keys
pub fn normalize_category(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|c| !c.is_empty()) else {
        return DEFAULT_CATEGORY.to_string();
    };

    let normalized = raw.to_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "movie" | "movies" | "cinema" => "film".to_string(),
        "food" | "restaurant" | "cafe" => "dining".to_string(),
        "hidden_gems" | "gem" => "hidden_gem".to_string(),
        _ => normalized,
    }
}

pub fn category_icon(category: &str) -> &'static str {
    match category {
        "music" => "🎵",
        "film" => "🎬",
        "fashion" => "👗",
        "dining" => "🍽️",
        "hidden_gem" => "💎",
        _ => DEFAULT_ICON,
    }
}

fn is_placeholder_time(time: &str) -> bool {
    PLACEHOLDER_TIMES.contains(&time.trim().to_lowercase().as_str())
}

/// Time for the activity at `index` (0-based) within its day when the model
/// gave none
pub fn default_time_slot(index: usize) -> String {
    if let Some(slot) = DEFAULT_SCHEDULE.get(index) {
        return slot.to_string();
    }

    let extra = (index + 1 - DEFAULT_SCHEDULE.len()) as i64;
    let last = NaiveTime::from_hms_opt(LAST_SLOT_HOUR, 0, 0).unwrap_or_default();
    let (time, _) = last.overflowing_add_signed(Duration::hours(extra * OVERFLOW_STEP_HOURS));
    time.format("%-I:%M %p").to_string()
}

fn resolve_time(time: Option<&str>, index: usize) -> String {
    match time {
        Some(time) if !is_placeholder_time(time) => time.trim().to_string(),
        _ => default_time_slot(index),
    }
}

fn text_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Turns model output into the response itinerary
///
/// Every activity leaves with a location record and an icon, whatever the
/// model omitted.
#[derive(Clone, Default)]
pub struct ItineraryEnricher {
    places: Option<Arc<dyn PlaceProvider>>,
}

impl ItineraryEnricher {
    pub fn new(places: Option<Arc<dyn PlaceProvider>>) -> Self {
        Self { places }
    }

    /// `destination` and `requested_days` stand in for whatever the model
    /// left out
    pub async fn enrich(
        &self,
        itinerary: Itinerary,
        destination: &str,
        requested_days: u32,
    ) -> TravelPlan {
        let city = itinerary
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(destination)
            .to_string();
        let duration = itinerary.duration.unwrap_or(requested_days.max(1));

        // Place lookups for every activity of every day run together
        let locations: Vec<Vec<Location>> = join_all(itinerary.days.iter().map(|day| {
            join_all(
                day.activities
                    .iter()
                    .map(|activity| self.locate(activity, &city)),
            )
        }))
        .await;

        let days = itinerary
            .days
            .into_iter()
            .zip(locations)
            .enumerate()
            .map(|(index, (day, locations))| Self::enrich_day(index, day, locations))
            .collect();

        TravelPlan {
            summary: format!("{}-day cultural itinerary for {}", duration, city),
            travel_image: travel_image(&city),
            destination: city,
            duration_days: duration,
            days,
        }
    }

    fn enrich_day(index: usize, day: Day, locations: Vec<Location>) -> PlanDay {
        let activities = day
            .activities
            .into_iter()
            .zip(locations)
            .enumerate()
            .map(|(position, (activity, location))| {
                let category = normalize_category(activity.category.as_deref());
                PlanActivity {
                    time: resolve_time(activity.time.as_deref(), position),
                    location,
                    category_icon: category_icon(&category).to_string(),
                    category,
                    description: activity
                        .description
                        .as_deref()
                        .or(activity.name.as_deref())
                        .map(str::trim)
                        .unwrap_or_default()
                        .to_string(),
                    cultural_connection: text_or_empty(activity.cultural_connection.as_deref()),
                }
            })
            .collect();

        PlanDay {
            day_number: day.day.unwrap_or(index as u32 + 1),
            theme: day
                .theme
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_THEME.to_string()),
            activities,
        }
    }

    async fn locate(&self, activity: &Activity, city: &str) -> Location {
        let name = activity.place_name().unwrap_or(UNKNOWN_LOCATION);
        let fallback = static_location(name, city);

        let Some(places) = &self.places else {
            return fallback;
        };
        if name == UNKNOWN_LOCATION {
            return fallback;
        }

        let query = format!("{}, {}", name, city);
        match places.find_place(&query).await {
            Ok(Some(place)) => Location {
                maps_link: place_link(&query, place.place_id.as_deref()),
                name: place.name,
                address: place.address,
                place_id: place.place_id,
            },
            Ok(None) => fallback,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    query = %query,
                    provider = places.name(),
                    "Place lookup failed, using static link"
                );
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::ActivityLocation;
    use crate::services::providers::{MockPlaceProvider, PlaceDetails};

    fn activity(location: &str, category: &str) -> Activity {
        Activity {
            location: Some(ActivityLocation::Name(location.to_string())),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    fn itinerary_with(activities: Vec<Activity>) -> Itinerary {
        Itinerary {
            destination: Some("Tokyo".to_string()),
            duration: Some(1),
            days: vec![Day {
                day: Some(1),
                theme: Some("Pop culture".to_string()),
                activities,
            }],
        }
    }

    #[test]
    fn test_static_location() {
        let location = static_location("Shibuya Crossing", "Tokyo");
        assert_eq!(location.name, "Shibuya Crossing");
        assert_eq!(location.address, "Shibuya Crossing, Tokyo");
        assert_eq!(
            location.maps_link,
            "https://www.google.com/maps/search/Shibuya+Crossing%2C+Tokyo"
        );
    }

    #[test]
    fn test_category_icons() {
        assert_eq!(category_icon("music"), "🎵");
        assert_eq!(category_icon("film"), "🎬");
        assert_eq!(category_icon("fashion"), "👗");
        assert_eq!(category_icon("dining"), "🍽️");
        assert_eq!(category_icon("hidden_gem"), "💎");
        assert_eq!(category_icon("karaoke"), "📍");
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(Some("Hidden Gem")), "hidden_gem");
        assert_eq!(normalize_category(Some("hidden-gem")), "hidden_gem");
        assert_eq!(normalize_category(Some("Movie")), "film");
        assert_eq!(normalize_category(Some("restaurant")), "dining");
        assert_eq!(normalize_category(Some("  ")), "general");
        assert_eq!(normalize_category(None), "general");
    }

    #[test]
    fn test_default_schedule_and_overflow() {
        let times: Vec<String> = (0..9).map(default_time_slot).collect();
        assert_eq!(
            times,
            vec![
                "9:00 AM", "11:00 AM", "1:00 PM", "3:00 PM", "6:00 PM", "8:00 PM", "9:00 PM",
                "10:00 PM", "11:00 PM"
            ]
        );
        assert_eq!(default_time_slot(9), "12:00 AM");
    }

    #[test]
    fn test_placeholder_times_replaced() {
        assert_eq!(resolve_time(Some("TBD"), 1), "11:00 AM");
        assert_eq!(resolve_time(Some(" "), 2), "1:00 PM");
        assert_eq!(resolve_time(None, 0), "9:00 AM");
        assert_eq!(resolve_time(Some("7:30 AM"), 0), "7:30 AM");
    }

    #[test]
    fn test_travel_image() {
        assert_eq!(
            travel_image("New York"),
            "https://picsum.photos/seed/New+York/1200/800"
        );
    }

    #[tokio::test]
    async fn test_enrich_backfills_times_for_every_position() {
        let activities = (0..8).map(|i| activity(&format!("Spot {}", i), "music")).collect();
        let plan = ItineraryEnricher::default()
            .enrich(itinerary_with(activities), "Tokyo", 1)
            .await;

        let times: Vec<&str> = plan.days[0]
            .activities
            .iter()
            .map(|a| a.time.as_str())
            .collect();
        assert_eq!(
            times,
            vec!["9:00 AM", "11:00 AM", "1:00 PM", "3:00 PM", "6:00 PM", "8:00 PM", "9:00 PM", "10:00 PM"]
        );
    }

    #[tokio::test]
    async fn test_enrich_fills_every_missing_field() {
        let itinerary = Itinerary {
            destination: None,
            duration: None,
            days: vec![
                Day {
                    day: None,
                    theme: None,
                    activities: vec![Activity::default(), Activity::default()],
                },
                Day::default(),
            ],
        };

        let plan = ItineraryEnricher::default().enrich(itinerary, "Lisbon", 2).await;
        assert_eq!(plan.destination, "Lisbon");
        assert_eq!(plan.duration_days, 2);
        assert_eq!(plan.summary, "2-day cultural itinerary for Lisbon");
        assert_eq!(plan.days[0].day_number, 1);
        assert_eq!(plan.days[1].day_number, 2);
        assert_eq!(plan.days[0].theme, "Cultural day");

        for activity in &plan.days[0].activities {
            assert_eq!(activity.location.name, "Unknown");
            assert!(!activity.location.address.is_empty());
            assert!(activity.location.maps_link.starts_with(MAPS_SEARCH_PREFIX));
            assert_eq!(activity.category, "general");
            assert_eq!(activity.category_icon, "📍");
        }
    }

    #[tokio::test]
    async fn test_missing_duration_uses_requested_days() {
        let itinerary = Itinerary {
            destination: Some("Tokyo".to_string()),
            duration: None,
            days: vec![Day {
                day: Some(1),
                theme: None,
                activities: vec![activity("Shimokitazawa", "fashion")],
            }],
        };

        let plan = ItineraryEnricher::default().enrich(itinerary, "Tokyo", 3).await;
        assert_eq!(plan.duration_days, 3);
        assert_eq!(plan.summary, "3-day cultural itinerary for Tokyo");
        assert_eq!(plan.days.len(), 1);
    }

    #[tokio::test]
    async fn test_model_duration_wins_over_requested_days() {
        let plan = ItineraryEnricher::default()
            .enrich(itinerary_with(vec![activity("Ginza", "fashion")]), "Tokyo", 4)
            .await;
        assert_eq!(plan.duration_days, 1);
    }

    #[tokio::test]
    async fn test_enrich_description_falls_back_to_name() {
        let itinerary = itinerary_with(vec![Activity {
            name: Some("Harajuku stroll".to_string()),
            ..Default::default()
        }]);

        let plan = ItineraryEnricher::default().enrich(itinerary, "Tokyo", 1).await;
        let activity = &plan.days[0].activities[0];
        assert_eq!(activity.description, "Harajuku stroll");
        assert_eq!(activity.location.name, "Harajuku stroll");
    }

    #[tokio::test]
    async fn test_place_lookup_used_when_found() {
        let mut places = MockPlaceProvider::new();
        places.expect_name().return_const("mock");
        places.expect_find_place().times(1).returning(|query| {
            assert_eq!(query, "Ghibli Museum, Tokyo");
            Ok(Some(PlaceDetails {
                name: "Ghibli Museum, Mitaka".to_string(),
                address: "1-1-83 Shimorenjaku, Mitaka".to_string(),
                place_id: Some("abc123".to_string()),
            }))
        });

        let enricher = ItineraryEnricher::new(Some(Arc::new(places)));
        let plan = enricher
            .enrich(itinerary_with(vec![activity("Ghibli Museum", "film")]), "Tokyo", 1)
            .await;

        let location = &plan.days[0].activities[0].location;
        assert_eq!(location.name, "Ghibli Museum, Mitaka");
        assert_eq!(location.address, "1-1-83 Shimorenjaku, Mitaka");
        assert_eq!(location.place_id.as_deref(), Some("abc123"));
        assert_eq!(
            location.maps_link,
            "https://www.google.com/maps/search/?api=1&query=Ghibli+Museum%2C+Tokyo&query_place_id=abc123"
        );
    }

    #[tokio::test]
    async fn test_place_lookup_failure_falls_back_to_static() {
        let mut places = MockPlaceProvider::new();
        places.expect_name().return_const("mock");
        places
            .expect_find_place()
            .times(2)
            .returning(|query| match query {
                "Golden Gai, Tokyo" => Ok(None),
                _ => Err(AppError::ExternalApi("quota".to_string())),
            });

        let enricher = ItineraryEnricher::new(Some(Arc::new(places)));
        let plan = enricher
            .enrich(
                itinerary_with(vec![activity("Golden Gai", "dining"), activity("Bape Store", "fashion")]),
                "Tokyo",
                1,
            )
            .await;

        let activities = &plan.days[0].activities;
        assert_eq!(activities[0].location, static_location("Golden Gai", "Tokyo"));
        assert_eq!(activities[1].location, static_location("Bape Store", "Tokyo"));
        assert_eq!(activities[1].category_icon, "👗");
    }

    #[tokio::test]
    async fn test_unknown_location_skips_place_lookup() {
        let mut places = MockPlaceProvider::new();
        places.expect_find_place().times(0);

        let enricher = ItineraryEnricher::new(Some(Arc::new(places)));
        let plan = enricher
            .enrich(itinerary_with(vec![Activity::default()]), "Tokyo", 1)
            .await;
        assert_eq!(plan.days[0].activities[0].location.name, "Unknown");
    }
}
