/// A macro to simplify read-through caching.
///
/// Checks the cache for `$key`. On a hit the cached value is returned as `Ok`.
/// On a miss the future produced by `$block` is awaited; an `Ok` value is
/// stored in the cache and returned, while an `Err` is returned untouched and
/// nothing is cached.
///
/// # Arguments
/// * `$cache`: A cache exposing `get_from_cache` and `set_in_background`.
/// * `$key`: The key to use for caching the value.
/// * `$block`: A future yielding `Result<T, E>`, run only on a miss.
///
/// # Example
/// ```rust,ignore
/// let recommendations = cached!(cache, cache_key, async move {
///     provider.fetch_recommendations(&entity_id, category, count).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Some(cached) => Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&$key, &value);
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
