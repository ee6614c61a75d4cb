use crate::config::{ConfigError, validate_cors, validate_gzip};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Method};
use regex::Regex;
use spire_domain::config::{CorsConfig, GzipConfig};
use std::borrow::Cow;
use std::time::Duration;
use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};

const WILDCARD: &str = "*";

/// Builds the CORS layer.
///
/// Browsers reject `*` together with credentials, so with `allow_credentials`
/// every wildcard mirrors the request instead.
///
/// # Errors
/// Fails on an invalid origin regex, origin, method or header name.
pub fn cors_layer(cors: &CorsConfig) -> Result<CorsLayer, ConfigError> {
    validate_cors(cors)?;
    let credentials = cors.allow_credentials;

    let origin = if has_wildcard(&cors.allow_origins) {
        if credentials { AllowOrigin::mirror_request() } else { AllowOrigin::any() }
    } else {
        let origins = parse_all(&cors.allow_origins, |o| HeaderValue::from_str(o).ok());
        match &cors.allow_origin_regex {
            Some(pattern) => {
                let regex = Regex::new(&format!("^(?:{pattern})$"))
                    .map_err(|err| ConfigError::Invalid { message: err.to_string().into(), context: Some(Cow::Borrowed("cors")) })?;
                AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
                    origins.contains(origin) || origin.to_str().is_ok_and(|o| regex.is_match(o))
                })
            }
            None => AllowOrigin::list(origins),
        }
    };

    let methods = if has_wildcard(&cors.allow_methods) {
        if credentials { AllowMethods::mirror_request() } else { Any.into() }
    } else {
        AllowMethods::list(parse_all(&cors.allow_methods, |m| Method::from_bytes(m.as_bytes()).ok()))
    };

    let headers = if has_wildcard(&cors.allow_headers) {
        if credentials { AllowHeaders::mirror_request() } else { Any.into() }
    } else {
        AllowHeaders::list(parse_all(&cors.allow_headers, |h| HeaderName::from_bytes(h.as_bytes()).ok()))
    };

    let expose = if has_wildcard(&cors.expose_headers) && !credentials {
        Any.into()
    } else {
        ExposeHeaders::list(parse_all(&cors.expose_headers, |h| HeaderName::from_bytes(h.as_bytes()).ok()))
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .expose_headers(expose)
        .allow_credentials(credentials)
        .max_age(Duration::from_secs(cors.max_age)))
}

/// Builds the gzip layer; bodies below `minimum_size`, images, gRPC and SSE stay uncompressed.
///
/// # Errors
/// Fails when the compression level is outside `0..=9`.
pub fn compression_layer(gzip: &GzipConfig) -> Result<CompressionLayer<impl Predicate + use<>>, ConfigError> {
    validate_gzip(gzip)?;
    let minimum_size = u16::try_from(gzip.minimum_size).unwrap_or(u16::MAX);
    let level = i32::try_from(gzip.compression_level).unwrap_or(9);

    let predicate = SizeAbove::new(minimum_size)
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE);

    Ok(CompressionLayer::new().quality(CompressionLevel::Precise(level)).compress_when(predicate))
}

fn has_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == WILDCARD)
}

fn parse_all<T>(values: &[String], parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    values.iter().filter(|v| *v != WILDCARD).filter_map(|v| parse(v)).collect()
}
