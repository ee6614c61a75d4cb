use axum::http::Uri;
use std::sync::Arc;
use url::form_urlencoded;

/// Derives the cache key of a request from its URI.
pub type CacheKeyBuilder = Arc<dyn Fn(&Uri) -> String + Send + Sync>;

/// Builds a cache key from the request path followed by its query parameters,
/// re-encoded after sorting by parameter name.
///
/// The sort is stable: repeated names keep their original relative order, so
/// `?tag=a&tag=b` and `?tag=b&tag=a` stay distinct while `?a=1&b=2` and `?b=2&a=1`
/// collapse to the same key.
///
/// ```rust
/// use spire_cache::default_cache_key_builder;
///
/// let uri = "/search?q=rust&page=2&lang=en".parse().unwrap();
/// assert_eq!(default_cache_key_builder(&uri), "/searchlang=en&page=2&q=rust");
/// ```
#[must_use]
pub fn default_cache_key_builder(uri: &Uri) -> String {
    let mut params: Vec<_> = uri
        .query()
        .map(|query| form_urlencoded::parse(query.as_bytes()).collect())
        .unwrap_or_default();
    params.sort_by(|(a, _), (b, _)| a.cmp(b));

    let query = form_urlencoded::Serializer::new(String::new()).extend_pairs(params).finish();

    format!("{}{query}", uri.path())
}
