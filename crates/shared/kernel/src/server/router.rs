use super::docs::openapi_router;
use super::layers::{compression_layer, cors_layer};
use super::state::AppState;
use super::static_files::static_files_router;
use crate::config::{ConfigError, validate};
use axum::Router;
use std::borrow::Cow;
use tower_http::trace::TraceLayer;
use utoipa_axum::router::OpenApiRouter;

#[spire_derive::spire_error]
pub enum RouterError {
    #[error("Router configuration error{}: {source}", format_context(.context))]
    Config { source: ConfigError, context: Option<Cow<'static, str>> },
    #[error("OpenAPI document error{}: {source}", format_context(.context))]
    Document { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

/// Assembles the final router: routes, docs, static mounts, then the CORS,
/// compression and tracing layers configured in `state`.
///
/// Wrap sub-routers with [`super::cached`] before passing them in to cache their
/// responses.
///
/// # Errors
/// Fails when the configuration does not pass [`validate`] (colliding or malformed
/// mount paths included), or the document cannot be serialized.
pub fn build_router(state: AppState, routes: OpenApiRouter<AppState>) -> Result<Router, RouterError> {
    let config = state.config.clone();
    validate(&config).context("Invalid configuration")?;
    let (router, api) = routes.split_for_parts();

    let mut app = router.merge(openapi_router(&config.openapi, api).context("[openapi]")?);
    for mount in &config.static_files {
        app = app.merge(static_files_router(mount));
    }

    if let Some(gzip) = &config.gzip {
        app = app.layer(compression_layer(gzip).context("[gzip]")?);
    }
    if let Some(cors) = &config.cors {
        app = app.layer(cors_layer(cors).context("[cors]")?);
    }

    Ok(app.layer(TraceLayer::new_for_http()).with_state(state))
}
