use crate::plugins::PluginRegistry;
use crate::response::{FallbackPolicy, HandlerOutput, ResponseContext, ResponseSettings, to_response};
use crate::template::{TemplateEngine, TemplateError};
use axum::extract::FromRef;
use axum::response::{IntoResponse, Response};
use spire_cache::{CacheConfig, CacheError};
use spire_domain::config::AppConfig;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[spire_derive::spire_error]
pub enum AppStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Response cache setup failed{}: {source}", format_context(.context))]
    Cache { source: CacheError, context: Option<Cow<'static, str>> },
    #[error("Template engine setup failed{}: {source}", format_context(.context))]
    Templates { source: TemplateError, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct AppStateInner {
    pub config: AppConfig,
    pub responses: ResponseContext,
    pub cache: CacheConfig,
}

/// Process-wide application state, cheap to clone into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// Materializes a handler result, turning failures into `500` responses.
    pub async fn respond(&self, output: impl Into<HandlerOutput>, settings: &ResponseSettings) -> Response {
        to_response(output.into(), settings, &self.inner.responses).await.unwrap_or_else(IntoResponse::into_response)
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<AppState> for CacheConfig {
    fn from_ref(state: &AppState) -> Self {
        state.inner.cache.clone()
    }
}

impl FromRef<AppState> for ResponseContext {
    fn from_ref(state: &AppState) -> Self {
        state.inner.responses.clone()
    }
}

#[derive(Debug, Default)]
pub struct AppStateBuilder {
    config: Option<AppConfig>,
    plugins: PluginRegistry,
    templates: Option<Arc<dyn TemplateEngine>>,
    fallback: FallbackPolicy,
    cache: Option<CacheConfig>,
}

impl AppStateBuilder {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Uses an engine built elsewhere instead of the one derived from `[templates]`.
    pub fn templates(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(engine);
        self
    }

    pub const fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Uses a custom cache (backend, expiration or key builder) instead of the
    /// in-memory one derived from `[cache]`.
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// # Errors
    /// Fails without a config, or when the cache or template engine cannot be built
    /// from it.
    pub fn build(self) -> Result<AppState, AppStateError> {
        let config = self.config.ok_or_else(|| AppStateError::Validation {
            message: "AppConfig not provided".into(),
            context: None,
        })?;

        let cache = match self.cache {
            Some(cache) => cache,
            None => CacheConfig::from_settings(&config.cache).context("[cache]")?,
        };

        let templates = match self.templates {
            Some(engine) => Some(engine),
            None => configured_templates(&config)?,
        };

        let responses = ResponseContext { plugins: self.plugins, templates, fallback: self.fallback };

        Ok(AppState { inner: Arc::new(AppStateInner { config, responses, cache }) })
    }
}

#[cfg(feature = "templates")]
fn configured_templates(config: &AppConfig) -> Result<Option<Arc<dyn TemplateEngine>>, AppStateError> {
    use crate::template::{JinjaEngine, TemplateConfig};
    use spire_domain::config::TemplateEngineKind;

    let Some(settings) = &config.templates else {
        return Ok(None);
    };
    let engine = match settings.engine {
        TemplateEngineKind::Jinja => TemplateConfig::<JinjaEngine>::new(settings.directories.iter().cloned())?.build()?,
    };
    Ok(Some(engine))
}

#[cfg(not(feature = "templates"))]
fn configured_templates(config: &AppConfig) -> Result<Option<Arc<dyn TemplateEngine>>, AppStateError> {
    match &config.templates {
        Some(_) => Err(AppStateError::Validation {
            message: "[templates] requires the `templates` feature".into(),
            context: None,
        }),
        None => Ok(None),
    }
}
