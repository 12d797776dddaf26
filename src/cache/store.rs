use lru::LruCache;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::models::{EntityId, TasteCategory};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Entity search by free-text name within one category
    EntityLookup {
        name: String,
        category: TasteCategory,
    },
    /// Recommendations for a resolved entity
    Recommendations {
        entity_id: EntityId,
        category: TasteCategory,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::EntityLookup { name, category } => write!(
                f,
                "lookup:{}:{}",
                category.entity_type(),
                name.trim().to_lowercase()
            ),
            CacheKey::Recommendations {
                entity_id,
                category,
            } => write!(f, "recs:{}:{}", category.domain(), entity_id),
        }
    }
}

/// Creates a Redis client for the optional second cache tier
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

#[derive(Clone)]
struct RedisTier {
    client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
    ttl: u64,
}

/// Read-through cache for recommendation lookups
///
/// Values are stored as JSON. The first tier is a capacity-bounded LRU held in
/// process memory; when a Redis client is supplied, misses fall through to
/// Redis and writes are mirrored there by a background task.
#[derive(Clone)]
pub struct Cache {
    memory: Arc<Mutex<LruCache<String, String>>>,
    redis: Option<RedisTier>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<usize>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes, then waits for it
    ///
    /// Returns the number of writes flushed during shutdown.
    pub async fn shutdown(self) -> usize {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");

        match self.task.await {
            Ok(flushed) => flushed,
            Err(e) => {
                tracing::error!(error = %e, "Cache writer task did not finish cleanly");
                0
            }
        }
    }
}

impl Cache {
    /// Creates a memory-only cache holding at most `capacity` entries
    pub fn in_memory(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            memory: Arc::new(Mutex::new(LruCache::new(capacity))),
            redis: None,
        }
    }

    /// Creates a two-tier cache backed by Redis
    ///
    /// Spawns the background task that performs Redis writes, so this must be
    /// called from inside a Tokio runtime.
    pub fn with_redis(capacity: usize, redis_client: Client, ttl: u64) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(Self::cache_writer_task(client, write_rx, shutdown_rx));

        let mut cache = Self::in_memory(capacity);
        cache.redis = Some(RedisTier {
            client: redis_client,
            write_tx,
            ttl,
        });

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown, drains whatever is already queued before exiting and
    /// reports how many of those writes succeeded.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) -> usize {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    let mut flushed = 0usize;
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    return flushed;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    async fn read_from_redis(tier: &RedisTier, key: &str) -> AppResult<Option<String>> {
        let mut conn = tier.client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key).await?;
        Ok(cached)
    }

    fn lock_memory(&self) -> MutexGuard<'_, LruCache<String, String>> {
        // A poisoned lock still holds valid JSON strings
        self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Checks memory first, then Redis when configured. A Redis hit is promoted
    /// into memory. Backend and deserialization failures are logged and
    /// reported as a miss.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();

        let in_memory = self.lock_memory().get(&key).cloned();
        let (json, from_redis) = match in_memory {
            Some(json) => (json, false),
            None => {
                let tier = self.redis.as_ref()?;
                match Self::read_from_redis(tier, &key).await {
                    Ok(Some(json)) => (json, true),
                    Ok(None) => return None,
                    Err(e) => {
                        tracing::warn!(error = %e, key = %key, "Redis cache read failed");
                        return None;
                    }
                }
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => {
                if from_redis {
                    self.insert_if_absent(key, json);
                }
                Some(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache deserialization error");
                None
            }
        }
    }

    /// Stores a value without waiting on any backend
    ///
    /// The memory tier is updated synchronously, insert-if-absent. The Redis
    /// write, if any, is queued for the background writer.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };
        let key = key.to_string();

        if let Some(tier) = &self.redis {
            let msg = CacheWriteMessage {
                key: key.clone(),
                value: json.clone(),
                ttl: tier.ttl,
            };
            if let Err(e) = tier.write_tx.send(msg) {
                tracing::error!(error = %e, "Failed to send cache write message");
            }
        }

        self.insert_if_absent(key, json);
    }

    fn insert_if_absent(&self, key: String, json: String) {
        let mut memory = self.lock_memory();
        if !memory.contains(&key) {
            memory.put(key, json);
        }
    }

    /// Number of entries currently held in memory
    pub fn len(&self) -> usize {
        self.lock_memory().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
