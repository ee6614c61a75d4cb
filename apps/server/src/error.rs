use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use spire::plugins::PluginError;
use std::borrow::Cow;
use tracing::debug;

/// Request-level failures of the demo routes.
#[spire_derive::spire_error]
pub enum ApiError {
    #[error("{resource} not found{}", format_context(.context))]
    NotFound { resource: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Invalid request body{}: {source}", format_context(.context))]
    InvalidBody { source: PluginError, context: Option<Cow<'static, str>> },
}

impl ApiError {
    pub(crate) fn not_found(resource: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { resource: resource.into(), context: None }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidBody { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(status = %status, error = %self, "Request rejected");
        (status, Json(json!({ "status_code": status.as_u16(), "detail": self.to_string() }))).into_response()
    }
}
