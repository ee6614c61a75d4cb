use super::content::allows_body;
use axum::BoxError;
use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderValue, InvalidHeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use spire_domain::media::MediaType;
use std::borrow::Cow;
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;

#[spire_derive::spire_error]
pub enum DescriptorError {
    #[error("Stream content must be iterable, got {kind}{}", format_context(.context))]
    NotIterable { kind: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("Not a regular file{}: {path}", format_context(.context))]
    NotAFile { path: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("File I/O failed{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
    #[error("Invalid header value{}: {source}", format_context(.context))]
    Header { source: InvalidHeaderValue, context: Option<Cow<'static, str>> },
}

/// Redirects the client to `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    path: String,
    status: Option<StatusCode>,
}

impl Redirect {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), status: None }
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The descriptor's own status, else the handler status when it is a redirect,
    /// else `307 Temporary Redirect`.
    #[must_use]
    pub fn effective_status(&self, handler_status: StatusCode) -> StatusCode {
        self.status.unwrap_or(if handler_status.is_redirection() {
            handler_status
        } else {
            StatusCode::TEMPORARY_REDIRECT
        })
    }

    pub(crate) fn into_response(self, handler_status: StatusCode) -> Result<Response, DescriptorError> {
        let status = self.effective_status(handler_status);
        let location = HeaderValue::try_from(self.path).context("redirect location")?;
        Ok((status, [(header::LOCATION, location)]).into_response())
    }
}

/// Sends a file from disk as a streamed attachment.
///
/// The file is checked and its metadata captured on construction; the body is
/// read lazily while the response is being written.
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
    filename: String,
    metadata: Metadata,
}

impl File {
    /// # Errors
    /// Fails if the path cannot be stat-ed or is not a regular file.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DescriptorError> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).context(path.display().to_string())?;
        if !metadata.is_file() {
            return Err(DescriptorError::NotAFile { path: path.display().to_string().into(), context: None });
        }
        let filename = path.file_name().map_or_else(String::new, |name| name.to_string_lossy().into_owned());

        Ok(Self { path, filename, metadata })
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Under a bodiless status (`204`, `304`, `1xx`) only the validators and the
    /// disposition are sent and the file is never opened.
    pub(crate) async fn into_response(self, status: StatusCode, fallback: &MediaType) -> Result<Response, DescriptorError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_str(&content_disposition(&self.filename))?);

        if let Ok(modified) = self.metadata.modified() {
            let modified: DateTime<Utc> = modified.into();
            let last_modified = modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
            headers.insert(header::LAST_MODIFIED, HeaderValue::from_str(&last_modified)?);

            let mtime = modified.timestamp_nanos_opt().unwrap_or_else(|| modified.timestamp());
            let etag = format!("\"{mtime:x}-{:x}\"", self.metadata.len());
            headers.insert(header::ETAG, HeaderValue::from_str(&etag)?);
        }

        if !allows_body(status) {
            return Ok((status, headers).into_response());
        }

        let file = tokio::fs::File::open(&self.path).await.context(self.path.display().to_string())?;
        let content_type = guess_media_type(&self.path).unwrap_or_else(|| fallback.as_str());
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.metadata.len()));

        Ok((status, headers, Body::from_stream(ReaderStream::new(file))).into_response())
    }
}

/// Chunked body pulled lazily from an iterator or an async stream.
pub struct Stream {
    chunks: BoxStream<'static, Result<Bytes, BoxError>>,
}

impl Stream {
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator + Send + 'static,
        I::IntoIter: Send + 'static,
        I::Item: Into<Bytes>,
    {
        Self { chunks: stream::iter(chunks).map(|chunk| Ok::<_, BoxError>(chunk.into())).boxed() }
    }

    pub fn from_stream<S>(chunks: S) -> Self
    where
        S: futures_util::Stream + Send + 'static,
        S::Item: Into<Bytes>,
    {
        Self { chunks: chunks.map(|chunk| Ok::<_, BoxError>(chunk.into())).boxed() }
    }

    /// A fallible stream; an error aborts the body mid-flight.
    pub fn try_from_stream<S, B, E>(chunks: S) -> Self
    where
        S: futures_util::Stream<Item = Result<B, E>> + Send + 'static,
        B: Into<Bytes> + 'static,
        E: Into<BoxError> + 'static,
    {
        Self { chunks: chunks.map_ok(Into::<Bytes>::into).map_err(Into::<BoxError>::into).boxed() }
    }

    pub(crate) fn into_response(self, status: StatusCode, media_type: &MediaType) -> Result<Response, DescriptorError> {
        if !allows_body(status) {
            return Ok(status.into_response());
        }
        let content_type = HeaderValue::from_str(media_type.as_str())?;
        Ok((status, [(header::CONTENT_TYPE, content_type)], Body::from_stream(self.chunks)).into_response())
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

/// Builds a stream from a JSON array; strings are sent verbatim, other items as JSON.
impl TryFrom<Value> for Stream {
    type Error = DescriptorError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let kind = match value {
            Value::Array(items) => {
                return Ok(Self::new(items.into_iter().map(|item| match item {
                    Value::String(text) => text,
                    other => other.to_string(),
                })));
            }
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        };
        Err(DescriptorError::NotIterable { kind: Cow::Borrowed(kind), context: None })
    }
}

/// Renders a named template with a JSON context.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub context: Value,
}

impl Template {
    pub fn new(name: impl Into<String>, context: Value) -> Self {
        Self { name: name.into(), context }
    }
}

fn guess_media_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(media_type)
}

/// `attachment` disposition; non-ASCII names use the RFC 5987 `filename*` form.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() && !filename.contains(['"', '\\']) {
        return format!("attachment; filename=\"{filename}\"");
    }

    let encoded: String = filename
        .bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => char::from(byte).to_string(),
            _ => format!("%{byte:02X}"),
        })
        .collect();
    format!("attachment; filename*=utf-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_status_precedence() {
        let redirect = Redirect::new("/x");
        assert_eq!(redirect.effective_status(StatusCode::OK), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(redirect.effective_status(StatusCode::MOVED_PERMANENTLY), StatusCode::MOVED_PERMANENTLY);

        let redirect = redirect.with_status(StatusCode::SEE_OTHER);
        assert_eq!(redirect.effective_status(StatusCode::MOVED_PERMANENTLY), StatusCode::SEE_OTHER);
    }

    #[test]
    fn stream_rejects_non_arrays() {
        let err = Stream::try_from(serde_json::json!({ "key": 1 })).expect_err("objects are not iterable");
        assert!(matches!(err, DescriptorError::NotIterable { ref kind, .. } if kind == "object"));
    }

    #[test]
    fn file_requires_a_regular_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(File::new(dir.path()), Err(DescriptorError::NotAFile { .. })));
        assert!(matches!(File::new(dir.path().join("missing")), Err(DescriptorError::Io { .. })));
    }

    #[test]
    fn disposition_escapes_non_ascii_names() {
        assert_eq!(content_disposition("report.pdf"), "attachment; filename=\"report.pdf\"");
        assert_eq!(content_disposition("звіт.txt"), "attachment; filename*=utf-8''%D0%B7%D0%B2%D1%96%D1%82.txt");
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(guess_media_type(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(guess_media_type(Path::new("a/b.unknown")), None);
    }
}
