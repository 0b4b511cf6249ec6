/// Read-through caching around an async computation.
///
/// Looks `$key` up in `$cache`; on a hit the cached value is returned. On a
/// miss the future `$block` is awaited, its value queued for caching with
/// `$ttl` seconds to live, and returned. A cache read failure is logged and
/// treated as a miss, so Redis being down never fails the request. Errors
/// from `$block` propagate with `?`.
///
/// Expands to an `AppResult`, so use it as the tail of a function returning one.
///
/// # Example
/// ```rust,ignore
/// async fn details(catalog: &dyn CatalogSource, cache: &Cache, id: u64) -> AppResult<MovieDetails> {
///     cached!(cache, CacheKey::MovieDetails(id), 3600, catalog.movie_details(id))
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed; fetching fresh");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
