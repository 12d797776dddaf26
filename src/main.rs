use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tastetrip_api::{
    cache::{create_redis_client, Cache, CacheWriterHandle},
    config::Config,
    routes::{create_router, AppState},
    services::{
        providers::{
            build_http_client, GeminiModel, GenerationOptions, GooglePlacesProvider,
            LanguageModel, PlaceProvider, QlooProvider, TasteProvider,
        },
        ItineraryEnricher, RecommendationClient, TripPlanner,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tastetrip_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let (cache, cache_writer) = build_cache(&config)?;
    let planner = build_planner(&config, cache)?;
    let app = create_router(Arc::new(AppState::new(planner)));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        let flushed = handle.shutdown().await;
        tracing::info!(flushed, "Cache writer drained");
    }
    tracing::info!("Server stopped");

    Ok(())
}

fn build_cache(config: &Config) -> anyhow::Result<(Cache, Option<CacheWriterHandle>)> {
    match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            let (cache, handle) =
                Cache::with_redis(config.cache_capacity, client, config.cache_ttl_secs);
            tracing::info!(capacity = config.cache_capacity, "Using in-memory cache with Redis tier");
            Ok((cache, Some(handle)))
        }
        None => {
            tracing::info!(capacity = config.cache_capacity, "Using in-memory cache");
            Ok((Cache::in_memory(config.cache_capacity), None))
        }
    }
}

fn build_planner(config: &Config, cache: Cache) -> anyhow::Result<TripPlanner> {
    let http_client = build_http_client(Duration::from_secs(config.http_timeout_secs))?;

    let model: Arc<dyn LanguageModel> = Arc::new(GeminiModel::new(
        http_client.clone(),
        config.google_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
    ));

    let taste: Arc<dyn TasteProvider> = Arc::new(QlooProvider::new(
        http_client.clone(),
        config.qloo_api_key.clone(),
        config.qloo_api_url.clone(),
    ));

    let places: Option<Arc<dyn PlaceProvider>> = config.google_places_api_key.as_ref().map(|key| {
        Arc::new(GooglePlacesProvider::new(
            http_client.clone(),
            key.clone(),
            config.places_api_url.clone(),
        )) as Arc<dyn PlaceProvider>
    });
    if places.is_none() {
        tracing::info!("No Places API key configured, using static map links");
    }

    Ok(TripPlanner::new(
        model,
        RecommendationClient::new(taste, cache, config.recommendation_count),
        ItineraryEnricher::new(places),
        GenerationOptions {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            thinking_budget: config.thinking_budget,
        },
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
