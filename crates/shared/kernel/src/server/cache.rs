use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use spire_cache::{CacheConfig, CachedResponse};
use tracing::{debug, warn};
use utoipa_axum::router::OpenApiRouter;

/// Caches successful `GET` responses of every route in `router`.
///
/// Applied as a route layer, so unmatched paths are never cached.
pub fn cached<S>(router: OpenApiRouter<S>, cache: CacheConfig) -> OpenApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(from_fn_with_state(cache, cache_responses))
}

async fn cache_responses(State(cache): State<CacheConfig>, request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let uri = request.uri().clone();
    if let Some(hit) = cache.lookup(&uri) {
        debug!(uri = %uri, "Serving cached response");
        return (hit.status, hit.headers, Body::from(hit.body)).into_response();
    }

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            cache.store(&uri, CachedResponse::new(parts.status, bytes.clone()).with_headers(parts.headers.clone()));
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            warn!(uri = %uri, error = %err, "Failed to buffer response for caching");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
