use std::sync::Arc;

use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::AppResult,
    models::{EntityId, RecommendationSet, TasteCategory, TasteQuery},
    services::providers::TasteProvider,
};

/// Read-through client over a taste provider
///
/// Every call is best effort: provider failures are logged and folded into an
/// absent id or an empty set, so callers never see an error.
#[derive(Clone)]
pub struct RecommendationClient {
    provider: Arc<dyn TasteProvider>,
    cache: Cache,
    count: u32,
}

impl RecommendationClient {
    pub fn new(provider: Arc<dyn TasteProvider>, cache: Cache, count: u32) -> Self {
        Self {
            provider,
            cache,
            count,
        }
    }

    /// Resolves a query to an entity id
    ///
    /// Misses are cached as well as hits; only failed calls are retried on the
    /// next request.
    pub async fn lookup(&self, query: &TasteQuery) -> Option<EntityId> {
        let key = CacheKey::EntityLookup {
            name: query.name.clone(),
            category: query.category,
        };

        let result: AppResult<Option<EntityId>> = cached!(self.cache, key, async {
            self.provider
                .search_entity(&query.name, query.category)
                .await
        });

        match result {
            Ok(entity_id) => entity_id,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    query = %query.name,
                    category = ?query.category,
                    provider = self.provider.name(),
                    "Entity lookup failed"
                );
                None
            }
        }
    }

    /// Fetches recommendations for a resolved entity
    ///
    /// An absent id returns an empty set without touching the provider.
    pub async fn recommend(
        &self,
        entity_id: Option<&EntityId>,
        category: TasteCategory,
    ) -> RecommendationSet {
        let Some(entity_id) = entity_id else {
            return Vec::new();
        };

        let key = CacheKey::Recommendations {
            entity_id: entity_id.clone(),
            category,
        };

        let result: AppResult<RecommendationSet> = cached!(self.cache, key, async {
            self.provider
                .fetch_recommendations(entity_id, category, self.count)
                .await
        });

        result.unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                entity_id = %entity_id,
                category = ?category,
                provider = self.provider.name(),
                "Recommendation fetch failed"
            );
            Vec::new()
        })
    }
}
