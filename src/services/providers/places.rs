//! Google Places text-search provider
//!
//! Used only when a Places API key is configured.
use crate::{
    error::{AppError, AppResult},
    services::providers::{PlaceDetails, PlaceProvider},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

#[derive(Clone)]
pub struct GooglePlacesProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<TextSearchResult>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    place_id: Option<String>,
}

impl TextSearchResponse {
    fn best_match(self) -> AppResult<Option<PlaceDetails>> {
        match self.status.as_str() {
            "OK" | "ZERO_RESULTS" | "" => {}
            status => {
                return Err(AppError::ExternalApi(format!(
                    "Places API returned status {}: {}",
                    status,
                    self.error_message.unwrap_or_default()
                )));
            }
        }

        Ok(self.results.into_iter().find_map(|result| {
            let name = result.name.filter(|n| !n.trim().is_empty())?;
            let address = result
                .formatted_address
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| name.clone());
            Some(PlaceDetails {
                name,
                address,
                place_id: result.place_id,
            })
        }))
    }
}

impl GooglePlacesProvider {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PlaceProvider for GooglePlacesProvider {
    async fn find_place(&self, query: &str) -> AppResult<Option<PlaceDetails>> {
        let url = format!("{}/maps/api/place/textsearch/json", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("query", query), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Places API returned status {}: {}",
                status, body
            )));
        }

        let search: TextSearchResponse = response.json().await?;
        search.best_match()
    }

    fn name(&self) -> &'static str {
        "google_places"
    }
}
