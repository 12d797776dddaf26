//! External collaborators
//!
//! Each upstream service sits behind a trait so the planner can be driven by
//! stubs in tests. Implementations return explicit results; deciding what a
//! failure means is left to the caller.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::AppResult,
    models::{EntityId, RecommendationSet, TasteCategory},
};

pub mod gemini;
pub mod places;
pub mod qloo;

pub use gemini::GeminiModel;
pub use places::GooglePlacesProvider;
pub use qloo::QlooProvider;

/// Sampling options for a single completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Reasoning token budget. `None` leaves the model's default in place;
    /// `Some(0)` disables thinking so the whole output limit goes to the reply.
    pub thinking_budget: Option<u32>,
}

/// Language-model completion provider
///
/// Output is free text. Callers must not assume it follows the requested shape.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Taste-graph recommendation provider
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TasteProvider: Send + Sync {
    /// Resolve a free-text name to the best matching entity, if any
    async fn search_entity(
        &self,
        name: &str,
        category: TasteCategory,
    ) -> AppResult<Option<EntityId>>;

    /// Fetch up to `count` recommended names for an entity
    async fn fetch_recommendations(
        &self,
        entity_id: &EntityId,
        category: TasteCategory,
        count: u32,
    ) -> AppResult<RecommendationSet>;

    fn name(&self) -> &'static str;
}

/// Best match returned by a place search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDetails {
    pub name: String,
    pub address: String,
    pub place_id: Option<String>,
}

/// Place-details provider, used to correct names and addresses
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaceProvider: Send + Sync {
    async fn find_place(&self, query: &str) -> AppResult<Option<PlaceDetails>>;

    fn name(&self) -> &'static str;
}

/// Shared HTTP client with the per-call timeout applied
pub fn build_http_client(timeout: Duration) -> AppResult<HttpClient> {
    let client = HttpClient::builder().timeout(timeout).build()?;
    Ok(client)
}
