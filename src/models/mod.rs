use serde::{Deserialize, Serialize};

pub mod itinerary;
pub mod taste;

pub use itinerary::{
    Activity, ActivityLocation, Day, Itinerary, Location, PlanActivity, PlanDay, TravelPlan,
};
pub use taste::{
    EntityId, RecommendationSet, Recommendations, TasteCategory, TastePreferences, TasteQuery,
    TripParameters,
};

/// Request body for itinerary generation
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateItineraryRequest {
    pub user_input: String,
}

/// Successful itinerary generation
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub status: &'static str,
    pub preferences: TripParameters,
    pub recommendations: Recommendations,
    pub travel_plan: TravelPlan,
}

impl PlanResponse {
    pub fn success(
        preferences: TripParameters,
        recommendations: Recommendations,
        travel_plan: TravelPlan,
    ) -> Self {
        Self {
            status: "success",
            preferences,
            recommendations,
            travel_plan,
        }
    }
}
