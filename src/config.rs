use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Gemini API key
    pub google_api_key: String,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model used for both parsing and itinerary synthesis
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Qloo API key
    pub qloo_api_key: String,

    /// Qloo API base URL
    #[serde(default = "default_qloo_api_url")]
    pub qloo_api_url: String,

    /// Google Places API key. Place lookups are skipped when unset.
    #[serde(default)]
    pub google_places_api_key: Option<String>,

    /// Google Places API base URL
    #[serde(default = "default_places_api_url")]
    pub places_api_url: String,

    /// Redis connection URL. Only the in-memory cache is used when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Maximum entries held by the in-memory LRU cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// TTL for entries written to Redis, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Number of recommendations requested per category
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: u32,

    /// Per-call timeout for every outbound HTTP request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Sampling temperature for itinerary synthesis
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token limit for itinerary synthesis
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Thinking budget for itinerary synthesis. Unset keeps the model default.
    #[serde(default)]
    pub thinking_budget: Option<u32>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_qloo_api_url() -> String {
    "https://hackathon.api.qloo.com".to_string()
}

fn default_places_api_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_cache_capacity() -> usize {
    128
}

fn default_cache_ttl_secs() -> u64 {
    86400
}

fn default_recommendation_count() -> u32 {
    5
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
