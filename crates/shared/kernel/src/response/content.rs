use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderValue, InvalidHeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use spire_domain::media::MediaType;

/// Plain handler output serialized according to the handler's media type.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty,
    Text(String),
    Json(Value),
    Bytes(Bytes),
}

impl Content {
    /// Encodes the body for `media_type`. Text is JSON-quoted only for JSON media,
    /// JSON strings are sent raw for textual media, and bytes always pass through.
    ///
    /// # Errors
    /// Fails only if the media type is not a valid header value.
    pub fn render(self, status: StatusCode, media_type: &MediaType) -> Result<Response, InvalidHeaderValue> {
        if !allows_body(status) {
            return Ok(status.into_response());
        }

        let body = match (self, media_type) {
            (Self::Empty, _) => Bytes::new(),
            (Self::Bytes(bytes), _) => bytes,
            (Self::Text(text), MediaType::Json) => Value::String(text).to_string().into(),
            (Self::Text(text), _) => text.into(),
            (Self::Json(Value::String(text)), _) if media_type.is_textual() => text.into(),
            (Self::Json(value), _) => value.to_string().into(),
        };

        let content_type = HeaderValue::from_str(media_type.as_str())?;
        Ok((status, [(header::CONTENT_TYPE, content_type)], Body::from(body)).into_response())
    }
}

/// `1xx`, `204 No Content` and `304 Not Modified` never carry a body.
pub(crate) fn allows_body(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&'static str> for Content {
    fn from(text: &'static str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<()> for Content {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.expect("body")
    }

    #[tokio::test]
    async fn text_is_quoted_for_json() {
        let response = Content::from("abc").render(StatusCode::OK, &MediaType::Json).expect("render");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body(response).await, "\"abc\"");
    }

    #[tokio::test]
    async fn json_strings_are_raw_for_text() {
        let response =
            Content::from(Value::from("<b>hi</b>")).render(StatusCode::OK, &MediaType::Html).expect("render");
        assert_eq!(body(response).await, "<b>hi</b>");
    }

    #[tokio::test]
    async fn no_content_drops_the_body() {
        let response = Content::from("ignored").render(StatusCode::NO_CONTENT, &MediaType::Text).expect("render");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(body(response).await.is_empty());
    }
}
