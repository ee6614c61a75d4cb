//! Framework kernel: the plugin protocol, response materialization, `OpenAPI`
//! assembly, templates and the HTTP layers built from configuration.
//!
//! ## Returning domain values
//! ```rust
//! use spire_kernel::prelude::*;
//!
//! # async fn example() -> Result<(), ResponseError> {
//! let ctx = ResponseContext::default();
//! let settings = ResponseSettings::default().status(StatusCode::MOVED_PERMANENTLY);
//!
//! let response = to_response(Redirect::new("/elsewhere").into(), &settings, &ctx).await?;
//! assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
//! # Ok(())
//! # }
//! ```
//!
//! ## Config loading
//! ```rust,ignore
//! use spire_kernel::config::load_app_config;
//!
//! let cfg = load_app_config(Some("spire.toml"))?;
//! ```
pub mod config;
pub mod openapi;
pub mod plugins;
pub mod prelude;
pub mod response;
pub mod server;
pub mod template;

pub use spire_cache as cache;
pub use spire_domain as domain;
