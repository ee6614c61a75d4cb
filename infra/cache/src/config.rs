use crate::backend::{CacheBackend, CachedResponse};
use crate::error::CacheError;
use crate::key::{CacheKeyBuilder, default_cache_key_builder};
use crate::memory::MemoryCache;
use axum::http::Uri;
use spire_domain::config::CacheSettings;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_EXPIRATION: Duration = Duration::from_secs(60);

/// Backend, entry lifetime and key derivation used by the response cache.
///
/// Cloning is cheap; every part is shared.
#[derive(Clone)]
pub struct CacheConfig {
    backend: Arc<dyn CacheBackend>,
    expiration: Duration,
    key_builder: CacheKeyBuilder,
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("backend", &self.backend)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl CacheConfig {
    #[must_use]
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Builds an in-memory cache from the `[cache]` configuration section.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] for a zero expiration or capacity.
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, CacheError> {
        if settings.capacity == 0 {
            return Err(CacheError::InvalidConfiguration {
                message: "capacity must be greater than zero".into(),
                context: None,
            });
        }

        Self::builder()
            .backend(MemoryCache::with_capacity(settings.capacity))
            .expiration(Duration::from_secs(settings.expiration))
            .build()
    }

    #[must_use]
    pub const fn expiration(&self) -> Duration {
        self.expiration
    }

    #[must_use]
    pub fn backend(&self) -> &dyn CacheBackend {
        self.backend.as_ref()
    }

    #[must_use]
    pub fn key_for(&self, uri: &Uri) -> String {
        (self.key_builder)(uri)
    }

    #[must_use]
    pub fn lookup(&self, uri: &Uri) -> Option<CachedResponse> {
        self.backend.get(&self.key_for(uri))
    }

    pub fn store(&self, uri: &Uri, response: CachedResponse) {
        let key = self.key_for(uri);
        debug!(key = %key, status = %response.status, "Caching response");
        self.backend.set(key, response, self.expiration);
    }

    pub fn evict(&self, uri: &Uri) {
        self.backend.delete(&self.key_for(uri));
    }
}

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Default)]
pub struct CacheConfigBuilder {
    backend: Option<Arc<dyn CacheBackend>>,
    expiration: Option<Duration>,
    key_builder: Option<CacheKeyBuilder>,
}

impl fmt::Debug for CacheConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfigBuilder")
            .field("backend", &self.backend)
            .field("expiration", &self.expiration)
            .field("custom_key_builder", &self.key_builder.is_some())
            .finish()
    }
}

impl CacheConfigBuilder {
    pub fn backend(mut self, backend: impl CacheBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn shared_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn key_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&Uri) -> String + Send + Sync + 'static,
    {
        self.key_builder = Some(Arc::new(builder));
        self
    }

    /// Finalizes the configuration; unspecified parts fall back to an in-memory backend,
    /// a 60 second expiration and [`default_cache_key_builder`].
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] if the expiration is zero.
    pub fn build(self) -> Result<CacheConfig, CacheError> {
        let expiration = self.expiration.unwrap_or(DEFAULT_EXPIRATION);
        if expiration.is_zero() {
            return Err(CacheError::InvalidConfiguration {
                message: "expiration must be greater than zero".into(),
                context: None,
            });
        }

        Ok(CacheConfig {
            backend: self.backend.unwrap_or_else(|| Arc::new(MemoryCache::new())),
            expiration,
            key_builder: self.key_builder.unwrap_or_else(|| Arc::new(default_cache_key_builder)),
        })
    }
}
