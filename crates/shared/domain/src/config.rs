use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level application configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: Option<CorsConfig>,
    pub gzip: Option<GzipConfig>,
    pub openapi: OpenApiConfig,
    pub static_files: Vec<StaticFilesConfig>,
    pub templates: Option<TemplateSettings>,
    pub cache: CacheSettings,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Seconds granted to in-flight requests on shutdown.
    pub shutdown_grace: u64,
}

/// Global tracing subscriber settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Extra `EnvFilter` directives, e.g. `spire_kernel=debug,tower_http=info`.
    pub filter: Option<String>,
    pub json: bool,
    /// Rolling log files are written here when set.
    pub directory: Option<PathBuf>,
}

/// Cross-origin resource sharing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    pub allow_origin_regex: Option<String>,
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime, in seconds.
    pub max_age: u64,
}

/// Response compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GzipConfig {
    /// Bodies smaller than this many bytes are sent uncompressed.
    pub minimum_size: u32,
    /// gzip level, `0..=9`.
    #[serde(alias = "compresslevel")]
    pub compression_level: u32,
}

/// `OpenAPI` document metadata and the docs mount point.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    pub create_examples: bool,
    /// Mount path of the documentation UI; the JSON lives at `{path}/openapi.json`.
    pub path: String,
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub contact: Option<ContactConfig>,
    pub license: Option<LicenseConfig>,
    pub servers: Vec<ServerSpec>,
    pub tags: Vec<TagSpec>,
    /// Each entry maps a security scheme name to its required scopes.
    pub security: Vec<BTreeMap<String, Vec<String>>>,
    pub terms_of_service: Option<String>,
    pub external_docs: Option<ExternalDocsConfig>,
    /// Raw `OpenAPI` path items keyed by webhook name.
    pub webhooks: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSpec {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalDocsConfig {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A static directory mount.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticFilesConfig {
    /// URL prefix, e.g. `/static`.
    pub path: String,
    /// Searched in order; the first directory holding the file wins.
    pub directories: Vec<PathBuf>,
    /// Serve `index.html` for directories and `404.html` on a miss.
    #[serde(default)]
    pub html_mode: bool,
}

/// Engine families that can be selected from configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateEngineKind {
    #[default]
    Jinja,
}

/// Template lookup settings; the engine callback is only available programmatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    pub directories: Vec<PathBuf>,
    pub engine: TemplateEngineKind,
}

/// Response cache settings; the backend itself is built at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry lifetime, in seconds.
    pub expiration: u64,
    /// Maximum number of cached responses.
    pub capacity: u64,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8000, shutdown_grace: 30 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, json: false, directory: None }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_owned()],
            allow_methods: vec!["*".to_owned()],
            allow_headers: vec!["*".to_owned()],
            allow_credentials: false,
            allow_origin_regex: None,
            expose_headers: Vec::new(),
            max_age: 600,
        }
    }
}

impl Default for GzipConfig {
    fn default() -> Self {
        Self { minimum_size: 500, compression_level: 9 }
    }
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            create_examples: false,
            path: "/schema".to_owned(),
            title: "Spire API".to_owned(),
            version: "1.0.0".to_owned(),
            description: None,
            contact: None,
            license: None,
            servers: vec![ServerSpec { url: "/".to_owned(), description: None }],
            tags: Vec::new(),
            security: Vec::new(),
            terms_of_service: None,
            external_docs: None,
            webhooks: BTreeMap::new(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { expiration: 60, capacity: 10_000 }
    }
}
