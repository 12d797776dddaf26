use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::PlanResponse,
    services::{
        aggregator,
        enricher::ItineraryEnricher,
        providers::{GenerationOptions, LanguageModel},
        recommendations::RecommendationClient,
        synthesizer, trip_parser,
    },
};

/// Runs one itinerary request end to end
///
/// parse → aggregate → synthesize → enrich. Only the synthesis step can fail
/// the request; the others degrade to defaults.
pub struct TripPlanner {
    model: Arc<dyn LanguageModel>,
    recommendations: RecommendationClient,
    enricher: ItineraryEnricher,
    generation: GenerationOptions,
}

impl TripPlanner {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        recommendations: RecommendationClient,
        enricher: ItineraryEnricher,
        generation: GenerationOptions,
    ) -> Self {
        Self {
            model,
            recommendations,
            enricher,
            generation,
        }
    }

    pub async fn plan(&self, user_input: &str) -> AppResult<PlanResponse> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(AppError::InvalidInput(
                "user_input cannot be empty".to_string(),
            ));
        }

        let params = trip_parser::parse_trip_parameters(self.model.as_ref(), user_input).await;
        let recommendations =
            aggregator::aggregate(&self.recommendations, &params.preferences).await;

        let itinerary = synthesizer::synthesize(
            self.model.as_ref(),
            &self.generation,
            user_input,
            &recommendations,
            &params.destination,
            params.days,
        )
        .await?;

        let travel_plan = self
            .enricher
            .enrich(itinerary, &params.destination, params.days)
            .await;

        Ok(PlanResponse::success(params, recommendations, travel_plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::services::providers::{MockLanguageModel, MockTasteProvider};
    use tokio_test::assert_ok;

    const OPTIONS: GenerationOptions = GenerationOptions {
        temperature: 0.7,
        max_output_tokens: 8192,
        thinking_budget: None,
    };

    fn offline_recommendations() -> RecommendationClient {
        let mut taste = MockTasteProvider::new();
        taste.expect_name().return_const("mock");
        taste
            .expect_search_entity()
            .returning(|_, _| Err(AppError::ExternalApi("offline".to_string())));
        RecommendationClient::new(Arc::new(taste), Cache::in_memory(8), 5)
    }

    fn planner_with(model: MockLanguageModel) -> TripPlanner {
        TripPlanner::new(
            Arc::new(model),
            offline_recommendations(),
            ItineraryEnricher::default(),
            OPTIONS,
        )
    }

    #[tokio::test]
    async fn test_blank_input_rejected_without_model_call() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().times(0);

        let err = planner_with(model).plan("   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_plan_uses_parsed_destination() {
        let mut model = MockLanguageModel::new();
        model.expect_name().return_const("mock");
        model.expect_complete().times(2).returning(|prompt, _| {
            if prompt.starts_with("Extract travel preferences") {
                Ok(r#"{"music": "Fado", "destination": "Lisbon", "days": 1}"#.to_string())
            } else {
                assert!(prompt.contains("- Music: Fado"));
                Ok(r#"{"days": [{"activities": [{"location": "Alfama", "category": "music"}]}]}"#
                    .to_string())
            }
        });

        let response = assert_ok!(planner_with(model).plan("fado night in Lisbon").await);
        assert_eq!(response.status, "success");
        assert_eq!(response.preferences.destination, "Lisbon");
        assert_eq!(response.recommendations.music, vec!["Fado"]);
        assert_eq!(response.travel_plan.destination, "Lisbon");
        assert_eq!(response.travel_plan.duration_days, 1);
        assert_eq!(
            response.travel_plan.days[0].activities[0].location.address,
            "Alfama, Lisbon"
        );
    }

    #[tokio::test]
    async fn test_requested_days_fill_missing_duration() {
        let mut model = MockLanguageModel::new();
        model.expect_name().return_const("mock");
        model.expect_complete().times(2).returning(|prompt, _| {
            if prompt.starts_with("Extract travel preferences") {
                Ok(r#"{"destination": "Seoul", "days": 3}"#.to_string())
            } else {
                Ok(r#"{"days": [{"activities": [{"location": "Hongdae"}]}]}"#.to_string())
            }
        });

        let response = assert_ok!(planner_with(model).plan("three days in Seoul").await);
        assert_eq!(response.travel_plan.duration_days, 3);
        assert_eq!(response.travel_plan.days.len(), 1);
        assert_eq!(
            response.travel_plan.summary,
            "3-day cultural itinerary for Seoul"
        );
    }

    #[tokio::test]
    async fn test_model_transport_failure_propagates() {
        let mut model = MockLanguageModel::new();
        model.expect_name().return_const("mock");
        model
            .expect_complete()
            .returning(|_, _| Err(AppError::ExternalApi("Gemini API returned status 503".to_string())));

        let err = planner_with(model).plan("anything").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }
}
