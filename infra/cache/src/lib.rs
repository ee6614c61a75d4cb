//! # Cache
//!
//! Response caching primitives for Spire applications.
//!
//! * [`CacheBackend`]: the storage contract. Implementations must be internally synchronized;
//!   handlers share one backend across all requests.
//! * [`MemoryCache`]: the default in-process backend on top of `moka`, honouring a per-entry
//!   expiration.
//! * [`default_cache_key_builder`]: path plus query parameters re-encoded in a stable,
//!   name-sorted order, so equivalent requests map to the same entry.
//! * [`CacheConfig`]: backend, expiration and key builder bundled together. It is built
//!   explicitly during startup; there is no process-wide default instance.
//!
//! # Example
//!
//! ```rust
//! use spire_cache::{CacheConfig, CachedResponse, MemoryCache};
//! use axum::http::{StatusCode, Uri};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), spire_cache::CacheError> {
//! let cache = CacheConfig::builder()
//!     .backend(MemoryCache::with_capacity(128))
//!     .expiration(Duration::from_secs(30))
//!     .build()?;
//!
//! let uri: Uri = "/items?b=2&a=1".parse().unwrap();
//! cache.store(&uri, CachedResponse::new(StatusCode::OK, "cached"));
//!
//! let same: Uri = "/items?a=1&b=2".parse().unwrap();
//! assert!(cache.lookup(&same).is_some());
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod error;
mod key;
mod memory;

pub use backend::{CacheBackend, CachedResponse};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::{CacheError, CacheErrorExt};
pub use key::{CacheKeyBuilder, default_cache_key_builder};
pub use memory::MemoryCache;
