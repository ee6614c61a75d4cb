use axum::http::{HeaderName, HeaderValue, Method};
use config::{Config, Environment, File};
use regex::Regex;
use serde::de::DeserializeOwned;
use spire_domain::config::{AppConfig, CacheSettings, CorsConfig, GzipConfig, OpenApiConfig, StaticFilesConfig};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "spire";
const ENV_PREFIX: &str = "SPIRE";

#[spire_derive::spire_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    Invalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ConfigError {
    fn invalid(section: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Invalid { message: message.into(), context: Some(Cow::Borrowed(section)) }
    }
}

/// Loads a configuration structure from a file layered with environment overrides.
///
/// 1. **Base file**: `path` (any extension the `config` crate understands). Without a
///    path, an optional `spire.*` file in the working directory is used.
/// 2. **Environment**: variables prefixed with `SPIRE__`, nested with double
///    underscores (`SPIRE__SERVER__PORT` maps to `server.port`).
///
/// # Errors
/// Fails if an explicitly given file is missing or the merged values do not
/// deserialize into `T`.
///
/// # Example
/// ```rust
/// use spire_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct Settings {
///     port: u16,
/// }
///
/// let cfg: Settings = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// [`load_config`] followed by [`validate`].
///
/// # Errors
/// Returns the first loading or validation failure.
pub fn load_app_config(path: Option<impl AsRef<Path>>) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = load_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Checks every section so misconfiguration fails at startup rather than per request.
///
/// # Errors
/// Returns [`ConfigError::Invalid`] naming the offending section.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(cors) = &config.cors {
        validate_cors(cors)?;
    }
    if let Some(gzip) = &config.gzip {
        validate_gzip(gzip)?;
    }
    validate_openapi(&config.openapi)?;
    for mount in &config.static_files {
        validate_static_files(mount)?;
    }
    validate_mounts(&config.openapi, &config.static_files)?;
    if let Some(templates) = &config.templates {
        require_directories("templates", &templates.directories)?;
    }
    validate_cache(&config.cache)
}

/// # Errors
/// Fails on an invalid origin regex, origin, method or header name.
pub fn validate_cors(cors: &CorsConfig) -> Result<(), ConfigError> {
    if let Some(pattern) = &cors.allow_origin_regex {
        Regex::new(pattern).map_err(|err| ConfigError::invalid("cors", format!("origin regex: {err}")))?;
    }
    for origin in cors.allow_origins.iter().filter(|o| *o != "*") {
        HeaderValue::from_str(origin).map_err(|_| ConfigError::invalid("cors", format!("origin {origin:?}")))?;
    }
    for method in cors.allow_methods.iter().filter(|m| *m != "*") {
        Method::from_bytes(method.as_bytes())
            .map_err(|_| ConfigError::invalid("cors", format!("method {method:?}")))?;
    }
    for name in cors.allow_headers.iter().chain(&cors.expose_headers).filter(|h| *h != "*") {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::invalid("cors", format!("header name {name:?}")))?;
    }
    Ok(())
}

/// # Errors
/// Fails when the compression level is outside `0..=9`.
pub fn validate_gzip(gzip: &GzipConfig) -> Result<(), ConfigError> {
    if gzip.compression_level > 9 {
        return Err(ConfigError::invalid(
            "gzip",
            format!("compression level must be within 0..=9, got {}", gzip.compression_level),
        ));
    }
    if u16::try_from(gzip.minimum_size).is_err() {
        return Err(ConfigError::invalid("gzip", format!("minimum size {} exceeds {}", gzip.minimum_size, u16::MAX)));
    }
    Ok(())
}

/// # Errors
/// Fails on an empty title or version, or a relative docs path.
pub fn validate_openapi(openapi: &OpenApiConfig) -> Result<(), ConfigError> {
    if openapi.title.trim().is_empty() {
        return Err(ConfigError::invalid("openapi", "title must not be empty"));
    }
    if openapi.version.trim().is_empty() {
        return Err(ConfigError::invalid("openapi", "version must not be empty"));
    }
    require_mount_path("openapi", &openapi.path)
}

/// # Errors
/// Fails on a relative mount path or a missing directory.
pub fn validate_static_files(mount: &StaticFilesConfig) -> Result<(), ConfigError> {
    require_mount_path("static_files", &mount.path)?;
    if mount.path.len() > 1 && mount.path.ends_with('/') {
        return Err(ConfigError::invalid("static_files", format!("mount path {:?} must not end with '/'", mount.path)));
    }
    if mount.directories.is_empty() {
        return Err(ConfigError::invalid("static_files", format!("{} has no directories", mount.path)));
    }
    require_directories("static_files", &mount.directories)
}

/// Rejects static mounts that share a path with each other or shadow the docs routes.
///
/// # Errors
/// Returns [`ConfigError::Invalid`] naming both colliding paths.
pub fn validate_mounts(openapi: &OpenApiConfig, mounts: &[StaticFilesConfig]) -> Result<(), ConfigError> {
    let docs = openapi.path.trim_end_matches('/');
    let docs_routes = [openapi.path.clone(), format!("{docs}/openapi.json")];

    for (index, mount) in mounts.iter().enumerate() {
        for other in &mounts[index + 1..] {
            let collides = if mount.path == "/" || other.path == "/" {
                mount.path == other.path
            } else {
                nests(&mount.path, &other.path) || nests(&other.path, &mount.path)
            };
            if collides {
                return Err(ConfigError::invalid(
                    "static_files",
                    format!("mount {:?} collides with mount {:?}", mount.path, other.path),
                ));
            }
        }

        if mount.path == "/" {
            continue;
        }
        if let Some(route) = docs_routes.iter().find(|route| nests(&mount.path, route)) {
            return Err(ConfigError::invalid(
                "static_files",
                format!("mount {:?} shadows the docs route {route:?}", mount.path),
            ));
        }
    }
    Ok(())
}

/// Whether `path` is `prefix` itself or lies below it.
fn nests(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_end_matches('/');
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

fn validate_cache(cache: &CacheSettings) -> Result<(), ConfigError> {
    if cache.expiration == 0 || cache.capacity == 0 {
        return Err(ConfigError::invalid("cache", "expiration and capacity must be greater than zero"));
    }
    Ok(())
}

fn require_mount_path(section: &'static str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::invalid(section, format!("mount path {path:?} must start with '/'")));
    }
    if path.contains("//") || path.contains(['{', '}', '*']) {
        return Err(ConfigError::invalid(section, format!("mount path {path:?} must be a plain path")));
    }
    Ok(())
}

fn require_directories(section: &'static str, directories: &[PathBuf]) -> Result<(), ConfigError> {
    match directories.iter().find(|dir| !dir.is_dir()) {
        Some(missing) => Err(ConfigError::invalid(section, format!("directory {} does not exist", missing.display()))),
        None => Ok(()),
    }
}
