use super::descriptors::DescriptorError;
use crate::plugins::PluginError;
use crate::template::TemplateError;
use axum::Json;
use axum::http::StatusCode;
use axum::http::header::InvalidHeaderValue;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::borrow::Cow;
use tracing::error;

#[spire_derive::spire_error]
pub enum ResponseError {
    #[error("Plugin failed{}: {source}", format_context(.context))]
    Plugin { source: PluginError, context: Option<Cow<'static, str>> },
    #[error("Response descriptor failed{}: {source}", format_context(.context))]
    Descriptor { source: DescriptorError, context: Option<Cow<'static, str>> },
    #[error("Template rendering failed{}: {source}", format_context(.context))]
    Template { source: TemplateError, context: Option<Cow<'static, str>> },
    #[error("Invalid media type{}: {source}", format_context(.context))]
    MediaType { source: InvalidHeaderValue, context: Option<Cow<'static, str>> },
    #[error("Response serialization failed{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
    #[error("No plugin registered for {type_name}{}", format_context(.context))]
    NoPlugin { type_name: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("{type_name} has no plugin and no serde fallback{}", format_context(.context))]
    Unserializable { type_name: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Template {name} requested but no template engine is configured{}", format_context(.context))]
    TemplatesDisabled { name: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Materialization failures surface as `500` with a JSON body.
impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        error!(error = %self, "Failed to build response");
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (status, Json(json!({ "status_code": status.as_u16(), "detail": self.to_string() }))).into_response()
    }
}
