use crate::openapi::{apply_config, to_document};
use axum::routing::get;
use axum::{Json, Router};
use spire_domain::config::OpenApiConfig;
use std::sync::Arc;
use utoipa::openapi::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Serves the document as JSON at `{path}/openapi.json` and the Scalar UI at `{path}`.
///
/// # Errors
/// Returns an error if the document cannot be serialized.
pub fn openapi_router<S>(config: &OpenApiConfig, api: OpenApi) -> Result<Router<S>, serde_json::Error>
where
    S: Clone + Send + Sync + 'static,
{
    let api = apply_config(config, api);
    let document = Arc::new(to_document(config, &api)?);
    let json_path = format!("{}/openapi.json", config.path.trim_end_matches('/'));

    let json = Router::new().route(
        &json_path,
        get(move || {
            let document = Arc::clone(&document);
            async move { Json(document.as_ref().clone()) }
        }),
    );

    Ok(json.merge(Scalar::with_url(config.path.clone(), api)))
}
