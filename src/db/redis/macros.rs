/// Memoizes an async computation in the Redis cache.
///
/// Looks `$key` up first and returns the cached value on a hit. On a miss the
/// future in `$block` is awaited, its value is queued for storage with
/// `$ttl` seconds to live, and the value is returned. A failed cache read is
/// logged and treated as a miss, so the cache never takes the upstream down
/// with it.
///
/// The whole expression evaluates to `AppResult<T>`; errors from `$block`
/// propagate with `?`.
///
/// # Example
/// ```rust,ignore
/// let page: AppResult<CatalogPage> = cached!(cache, key, 300, self.fetch_page(path, query));
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(cached)
            }
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(key = %$key, error = %e, "Cache read failed");
                }
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
