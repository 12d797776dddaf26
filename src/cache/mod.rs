pub mod store;

mod macros;

pub use store::create_redis_client;
pub use store::Cache;
pub use store::CacheKey;
pub use store::CacheWriterHandle;
