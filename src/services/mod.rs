pub mod aggregator;
pub mod enricher;
pub mod json_extract;
pub mod planner;
pub mod providers;
pub mod recommendations;
pub mod synthesizer;
pub mod trip_parser;

pub use enricher::ItineraryEnricher;
pub use planner::TripPlanner;
pub use recommendations::RecommendationClient;
