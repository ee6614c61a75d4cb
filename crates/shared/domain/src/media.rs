use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type of a response body produced by a handler.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Json,
    Html,
    Text,
    /// Any other concrete `type/subtype` string.
    #[serde(untagged)]
    Other(String),
}

impl MediaType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
            Self::Other(raw) => raw,
        }
    }

    /// `true` for media types whose bodies are rendered as text rather than JSON,
    /// including any custom `text/*` type.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        match self {
            Self::Html | Self::Text => true,
            Self::Json => false,
            Self::Other(raw) => raw.trim_start().get(..5).is_some_and(|kind| kind.eq_ignore_ascii_case("text/")),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of an incoming request body, used to key `OpenAPI` request bodies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestEncodingType {
    #[default]
    Json,
    MultiPart,
    UrlEncoded,
}

impl RequestEncodingType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::MultiPart => "multipart/form-data",
            Self::UrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl fmt::Display for RequestEncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
