//! Facade crate for Spire.
//! Re-exports the domain, kernel and cache crates under one name.
//! Keep this crate thin: it composes other crates and implements nothing itself.
//!
//! ## Usage
//! - Depend on `spire` with the desired features (`templates`, `logger`).
//! - Import [`prelude`] in handlers; reach for the module re-exports for the rest.

pub use spire_cache as cache;
pub use spire_domain as domain;
pub use spire_kernel as kernel;
#[cfg(feature = "logger")]
pub use spire_logger as logger;

pub use spire_kernel::{config, openapi, plugins, response, server, template};

pub mod prelude {
    pub use spire_cache::{CacheConfig, CachedResponse, default_cache_key_builder};
    pub use spire_domain::config::AppConfig;
    pub use spire_kernel::prelude::*;
}

/// Build-time enabled features.
pub mod features {
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "templates")]
        "templates",
        #[cfg(feature = "logger")]
        "logger",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}
