//! Qloo taste-graph provider
//!
//! API Flow:
//! 1. Entity search: GET /search?query=..&types=urn:entity:.. → first result's id
//! 2. Recommendations: POST /recommendations/{domain} with {"ids": [id], "count": n}
use crate::{
    error::{AppError, AppResult},
    models::{EntityId, RecommendationSet, TasteCategory},
    services::providers::TasteProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

#[derive(Clone)]
pub struct QlooProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

/// One search hit
///
/// The id has been observed in three places across API revisions. Resolution
/// order is `entity.id`, then `entity_id`, then `id`.
#[derive(Debug, Deserialize)]
struct QlooSearchResult {
    #[serde(default)]
    entity: Option<QlooNestedEntity>,
    #[serde(default)]
    entity_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QlooNestedEntity {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QlooSearchResponse {
    #[serde(default)]
    results: Vec<QlooSearchResult>,
}

#[derive(Debug, Deserialize)]
struct QlooRecommendation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct QlooRecommendationResponse {
    #[serde(default, alias = "results")]
    recommendations: Vec<QlooRecommendation>,
}

impl QlooSearchResult {
    fn resolve_id(self) -> Option<EntityId> {
        let non_blank = |id: &String| !id.trim().is_empty();
        self.entity
            .and_then(|entity| entity.id)
            .filter(non_blank)
            .or(self.entity_id.filter(non_blank))
            .or(self.id.filter(non_blank))
            .map(EntityId)
    }
}

impl QlooSearchResponse {
    fn first_entity_id(self) -> Option<EntityId> {
        self.results.into_iter().next().and_then(QlooSearchResult::resolve_id)
    }
}

impl QlooRecommendationResponse {
    fn names(self) -> RecommendationSet {
        self.recommendations
            .into_iter()
            .map(|r| r.name)
            .filter(|name| !name.trim().is_empty())
            .collect()
    }
}

impl QlooProvider {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn ensure_success(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::ExternalApi(format!(
            "Qloo API returned status {}: {}",
            status, body
        )))
    }
}

#[async_trait::async_trait]
impl TasteProvider for QlooProvider {
    async fn search_entity(
        &self,
        name: &str,
        category: TasteCategory,
    ) -> AppResult<Option<EntityId>> {
        let url = format!("{}/search", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(&[("query", name), ("types", category.entity_type())])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let search: QlooSearchResponse = response.json().await?;
        let entity_id = search.first_entity_id();

        tracing::debug!(
            query = %name,
            category = ?category,
            found = entity_id.is_some(),
            provider = "qloo",
            "Entity search completed"
        );

        Ok(entity_id)
    }

    async fn fetch_recommendations(
        &self,
        entity_id: &EntityId,
        category: TasteCategory,
        count: u32,
    ) -> AppResult<RecommendationSet> {
        let url = format!("{}/recommendations/{}", self.api_url, category.domain());

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "ids": [entity_id.as_str()],
                "count": count,
            }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let recommendations: QlooRecommendationResponse = response.json().await?;
        let names = recommendations.names();

        tracing::debug!(
            entity_id = %entity_id,
            category = ?category,
            results = names.len(),
            provider = "qloo",
            "Recommendations fetched"
        );

        Ok(names)
    }

    fn name(&self) -> &'static str {
        "qloo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_nested_entity_id_preferred() {
        let json = r#"{
            "results": [
                { "entity": { "id": "nested" }, "entity_id": "flat", "id": "top" }
            ]
        }"#;

        let response: QlooSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_entity_id(), Some(EntityId::new("nested")));
    }

    #[test]
    fn test_search_entity_id_field() {
        let json = r#"{ "results": [ { "entity_id": "flat", "id": "top" } ] }"#;
        let response: QlooSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_entity_id(), Some(EntityId::new("flat")));
    }

    #[test]
    fn test_search_plain_id_field() {
        let json = r#"{ "results": [ { "id": "top", "name": "BTS" } ] }"#;
        let response: QlooSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_entity_id(), Some(EntityId::new("top")));
    }

    #[test]
    fn test_search_empty_results() {
        let response: QlooSearchResponse = serde_json::from_str(r#"{ "results": [] }"#).unwrap();
        assert_eq!(response.first_entity_id(), None);

        let response: QlooSearchResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.first_entity_id(), None);
    }

    #[test]
    fn test_search_blank_id_is_a_miss() {
        let json = r#"{ "results": [ { "id": "  " } ] }"#;
        let response: QlooSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_entity_id(), None);
    }

    #[test]
    fn test_search_blank_nested_id_falls_through() {
        let json = r#"{ "results": [ { "entity": { "id": "" }, "id": "top" } ] }"#;
        let response: QlooSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_entity_id(), Some(EntityId::new("top")));
    }

    #[test]
    fn test_recommendation_names() {
        let json = r#"{
            "recommendations": [
                { "name": "SEVENTEEN", "entity_id": "x" },
                { "name": "" },
                { "name": "TXT" }
            ]
        }"#;

        let response: QlooRecommendationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.names(), vec!["SEVENTEEN", "TXT"]);
    }

    #[test]
    fn test_recommendation_results_alias() {
        let json = r#"{ "results": [ { "name": "Spirited Away" } ] }"#;
        let response: QlooRecommendationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.names(), vec!["Spirited Away"]);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = QlooProvider::new(
            HttpClient::new(),
            "test_key".to_string(),
            "http://test.local/".to_string(),
        );
        assert_eq!(provider.api_url, "http://test.local");
    }
}
