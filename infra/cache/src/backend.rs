use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use std::fmt::Debug;
use std::time::Duration;

/// A fully buffered response kept by a [`CacheBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Storage contract for cached responses.
///
/// Backends are shared by every request, so implementations synchronize internally.
/// Expired entries must never be returned from [`CacheBackend::get`].
pub trait CacheBackend: Debug + Send + Sync {
    fn get(&self, key: &str) -> Option<CachedResponse>;

    fn set(&self, key: String, value: CachedResponse, expiration: Duration);

    fn delete(&self, key: &str);
}
