//! Turns handler return values into wire responses.
//!
//! [`to_response`] inspects a [`HandlerOutput`] and picks the first matching case:
//! pre-built responses pass through untouched, descriptors ([`Redirect`], [`File`],
//! [`Stream`], [`Template`]) build their own responses, domain values go through
//! the plugin registry, and plain [`Content`] is encoded by the handler's media type.

mod content;
mod descriptors;
mod error;

pub use content::Content;
pub use descriptors::{DescriptorError, DescriptorErrorExt, File, Redirect, Stream, Template};
pub use error::{ResponseError, ResponseErrorExt};

use crate::plugins::{Candidate, DomainValue, OneOrMany, PluginRegistry};
use crate::template::TemplateEngine;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use serde_json::Value;
use spire_domain::media::MediaType;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// What happens to a domain value that no plugin claims.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Serialize through the value's serde fallback.
    #[default]
    Serialize,
    /// Fail with [`ResponseError::NoPlugin`].
    Reject,
}

/// Handler-level response parameters, applied to every constructed response.
#[derive(Debug, Clone)]
pub struct ResponseSettings {
    pub status: StatusCode,
    pub media_type: MediaType,
    pub headers: HeaderMap,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self { status: StatusCode::OK, media_type: MediaType::Json, headers: HeaderMap::new() }
    }
}

impl ResponseSettings {
    /// `201` for `POST`, `204` for `DELETE`, `200` otherwise.
    #[must_use]
    pub fn for_method(method: &Method) -> Self {
        let status = match *method {
            Method::POST => StatusCode::CREATED,
            Method::DELETE => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        };
        Self { status, ..Self::default() }
    }

    #[must_use]
    pub const fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// Everything a handler may return.
#[derive(Debug)]
pub enum HandlerOutput {
    Response(Response),
    Redirect(Redirect),
    File(File),
    Stream(Stream),
    Template(Template),
    Model(DomainValue),
    Models(Vec<DomainValue>),
    Content(Content),
}

impl HandlerOutput {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Response(_) => "response",
            Self::Redirect(_) => "redirect",
            Self::File(_) => "file",
            Self::Stream(_) => "stream",
            Self::Template(_) => "template",
            Self::Model(_) => "model",
            Self::Models(_) => "models",
            Self::Content(_) => "content",
        }
    }
}

/// Shared collaborators consulted while materializing responses.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    pub plugins: PluginRegistry,
    pub templates: Option<Arc<dyn TemplateEngine>>,
    pub fallback: FallbackPolicy,
}

/// Materializes a handler's return value.
///
/// Pre-built responses are returned as-is; every other case gets the settings'
/// headers appended.
///
/// # Errors
/// Plugin, descriptor and template failures propagate unchanged inside
/// [`ResponseError`]. Unclaimed domain values fail according to the [`FallbackPolicy`].
pub async fn to_response(
    output: HandlerOutput,
    settings: &ResponseSettings,
    ctx: &ResponseContext,
) -> Result<Response, ResponseError> {
    debug!(kind = output.kind(), status = %settings.status, "Materializing response");

    let mut response = match output {
        HandlerOutput::Response(response) => return Ok(response),
        HandlerOutput::Redirect(redirect) => redirect.into_response(settings.status)?,
        HandlerOutput::File(file) => file.into_response(settings.status, &settings.media_type).await?,
        HandlerOutput::Stream(stream) => stream.into_response(settings.status, &settings.media_type)?,
        HandlerOutput::Template(template) => render_template(template, settings.status, ctx)?,
        HandlerOutput::Model(value) => {
            Content::Json(model_content(OneOrMany::One(value), ctx)?).render(settings.status, &settings.media_type)?
        }
        HandlerOutput::Models(values) => {
            Content::Json(model_content(OneOrMany::Many(values), ctx)?).render(settings.status, &settings.media_type)?
        }
        HandlerOutput::Content(content) => content.render(settings.status, &settings.media_type)?,
    };

    response.headers_mut().extend(settings.headers.clone());
    Ok(response)
}

fn render_template(template: Template, status: StatusCode, ctx: &ResponseContext) -> Result<Response, ResponseError> {
    let engine = ctx
        .templates
        .as_ref()
        .ok_or_else(|| ResponseError::TemplatesDisabled { name: Cow::Owned(template.name.clone()), context: None })?;

    let html = engine.render(&template.name, &template.context)?;
    Ok(Content::Text(html).render(status, &MediaType::Html)?)
}

fn model_content(values: OneOrMany<DomainValue>, ctx: &ResponseContext) -> Result<Value, ResponseError> {
    let plugin = match &values {
        OneOrMany::One(value) => ctx.plugins.resolve(Candidate::Value(value)),
        OneOrMany::Many(values) => ctx.plugins.resolve(Candidate::Sequence(values)),
    };

    let converted = match plugin {
        Some(plugin) => values.try_map(|value| Ok::<_, ResponseError>(Value::Object(plugin.to_dict(&value)?)))?,
        None => values.try_map(|value| fallback_value(&value, ctx.fallback))?,
    };

    Ok(match converted {
        OneOrMany::One(value) => value,
        OneOrMany::Many(values) => Value::Array(values),
    })
}

fn fallback_value(value: &DomainValue, policy: FallbackPolicy) -> Result<Value, ResponseError> {
    let type_name = Cow::Borrowed(value.model_type().name());
    if policy == FallbackPolicy::Reject {
        return Err(ResponseError::NoPlugin { type_name, context: None });
    }

    let json = value.to_json().ok_or(ResponseError::Unserializable { type_name, context: None })?;
    Ok(json?)
}

impl From<Response> for HandlerOutput {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Redirect> for HandlerOutput {
    fn from(redirect: Redirect) -> Self {
        Self::Redirect(redirect)
    }
}

impl From<File> for HandlerOutput {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

impl From<Stream> for HandlerOutput {
    fn from(stream: Stream) -> Self {
        Self::Stream(stream)
    }
}

impl From<Template> for HandlerOutput {
    fn from(template: Template) -> Self {
        Self::Template(template)
    }
}

impl From<DomainValue> for HandlerOutput {
    fn from(value: DomainValue) -> Self {
        Self::Model(value)
    }
}

impl From<Vec<DomainValue>> for HandlerOutput {
    fn from(values: Vec<DomainValue>) -> Self {
        Self::Models(values)
    }
}

impl From<Content> for HandlerOutput {
    fn from(content: Content) -> Self {
        Self::Content(content)
    }
}

impl From<String> for HandlerOutput {
    fn from(text: String) -> Self {
        Self::Content(Content::Text(text))
    }
}

impl From<Value> for HandlerOutput {
    fn from(value: Value) -> Self {
        Self::Content(Content::Json(value))
    }
}
