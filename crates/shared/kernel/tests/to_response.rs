mod support;

use axum::body::{Bytes, to_bytes};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::stream;
use serde_json::{Value, json};
use spire_kernel::plugins::{
    DomainValue, FieldKind, FieldSpec, IntermediateModel, PluginError, PluginRegistry, SerdePlugin,
};
use spire_kernel::response::{
    Content, DescriptorError, File, FallbackPolicy, HandlerOutput, Redirect, ResponseContext, ResponseError,
    ResponseSettings, Stream, Template, to_response,
};
use spire_kernel::template::{JinjaEngine, TemplateConfig};
use spire_domain::media::MediaType;
use support::{Person, PersonPlugin};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Pet {
    name: String,
}

fn ctx() -> ResponseContext {
    ResponseContext {
        plugins: PluginRegistry::builder().register(PersonPlugin).build(),
        ..ResponseContext::default()
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

#[tokio::test]
async fn prebuilt_responses_pass_through_untouched() {
    let prebuilt = (StatusCode::ACCEPTED, [(header::ETAG, "\"v1\"")], "done").into_response();
    let settings = ResponseSettings::default()
        .status(StatusCode::OK)
        .header(HeaderName::from_static("x-extra"), HeaderValue::from_static("1"));

    let response = to_response(prebuilt.into(), &settings, &ctx()).await.expect("response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()[header::ETAG], "\"v1\"");
    assert!(response.headers().get("x-extra").is_none());
    assert_eq!(body_text(response).await, "done");
}

#[tokio::test]
async fn redirect_uses_handler_status_and_location() {
    let settings = ResponseSettings::default().status(StatusCode::MOVED_PERMANENTLY);

    let response = to_response(Redirect::new("/x").into(), &settings, &ctx()).await.expect("redirect");

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/x");
}

#[tokio::test]
async fn redirect_defaults_to_temporary() {
    let response = to_response(Redirect::new("/login").into(), &ResponseSettings::default(), &ctx())
        .await
        .expect("redirect");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn stream_concatenates_chunks_in_order() {
    let chunks = ["<html>", "<li>1</li>", "<li>2</li>", "<li>3</li>", "</html>"];
    let settings = ResponseSettings::default().media_type(MediaType::Html);

    let response = to_response(Stream::new(chunks).into(), &settings, &ctx()).await.expect("stream");

    assert_eq!(response.headers()[header::CONTENT_TYPE], MediaType::Html.as_str());
    assert_eq!(body_text(response).await, chunks.concat());
}

#[tokio::test]
async fn stream_accepts_async_sources() {
    let source = stream::iter(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
    let response =
        to_response(Stream::from_stream(source).into(), &ResponseSettings::default(), &ctx()).await.expect("stream");
    assert_eq!(body_text(response).await, "ab");

    let fallible = stream::iter(vec![Ok::<_, std::io::Error>("c"), Ok("d")]);
    let response =
        to_response(Stream::try_from_stream(fallible).into(), &ResponseSettings::default(), &ctx()).await.expect("stream");
    assert_eq!(body_text(response).await, "cd");
}

#[test]
fn stream_from_an_object_is_rejected() {
    let err = Stream::try_from(json!({ "a": 1 })).expect_err("not iterable");
    assert!(matches!(err, DescriptorError::NotIterable { .. }));
    assert!(Stream::try_from(json!(["a", 1])).is_ok());
}

#[tokio::test]
async fn file_response_carries_metadata_headers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello file").expect("write");

    let file = File::new(&path).expect("file").with_filename("report.txt");
    let response = to_response(file.into(), &ResponseSettings::default(), &ctx()).await.expect("file");

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(headers[header::CONTENT_LENGTH], "10");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"report.txt\"");
    assert!(headers.contains_key(header::LAST_MODIFIED));
    assert!(headers.contains_key(header::ETAG));
    assert_eq!(body_text(response).await, "hello file");
}

#[tokio::test]
async fn models_are_serialized_by_their_plugin() {
    let value = DomainValue::new(Person::new("Ada", "Lovelace", 36));

    let response = to_response(value.into(), &ResponseSettings::default(), &ctx()).await.expect("model");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], MediaType::Json.as_str());
    assert_eq!(body_json(response).await, json!({ "first_name": "Ada", "last_name": "Lovelace", "age": 36 }));
}

#[tokio::test]
async fn model_sequences_keep_order() {
    let people = vec![
        DomainValue::new(Person::new("A", "One", 1)),
        DomainValue::new(Person::new("B", "Two", 2)),
    ];

    let response = to_response(people.into(), &ResponseSettings::for_method(&Method::POST), &ctx()).await.expect("models");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body[0]["first_name"], "A");
    assert_eq!(body[1]["first_name"], "B");
}

#[tokio::test]
async fn serde_plugin_models_serialize() {
    let plugins = PluginRegistry::builder()
        .register(SerdePlugin::<Pet>::new(IntermediateModel::new("Pet").field(FieldSpec::required("name", FieldKind::String))))
        .build();
    let ctx = ResponseContext { plugins, ..ResponseContext::default() };

    let value = DomainValue::serializable(Pet { name: "Rex".to_owned() });
    let response = to_response(value.into(), &ResponseSettings::default(), &ctx).await.expect("model");

    assert_eq!(body_json(response).await, json!({ "name": "Rex" }));
}

#[tokio::test]
async fn unclaimed_models_follow_the_fallback_policy() {
    let pet = || DomainValue::serializable(Pet { name: "Rex".to_owned() });

    let response = to_response(pet().into(), &ResponseSettings::default(), &ctx()).await.expect("serde fallback");
    assert_eq!(body_json(response).await, json!({ "name": "Rex" }));

    let strict = ResponseContext { fallback: FallbackPolicy::Reject, ..ctx() };
    let err = to_response(pet().into(), &ResponseSettings::default(), &strict).await.expect_err("rejected");
    assert!(matches!(err, ResponseError::NoPlugin { .. }));

    let opaque = DomainValue::new(42_u64);
    let err = to_response(opaque.into(), &ResponseSettings::default(), &ctx()).await.expect_err("no serde fallback");
    assert!(matches!(err, ResponseError::Unserializable { .. }));
}

#[tokio::test]
async fn plugin_conversion_errors_propagate() {
    let mixed = vec![DomainValue::new(Person::new("Ada", "Lovelace", 36)), DomainValue::new(42_u64)];

    let err = to_response(mixed.into(), &ResponseSettings::default(), &ctx()).await.expect_err("foreign value");

    assert!(matches!(err, ResponseError::Plugin { source: PluginError::Unsupported { .. }, .. }));
}

#[tokio::test]
async fn plain_content_follows_media_type() {
    let text = ResponseSettings::default().media_type(MediaType::Text);
    let response = to_response("hello".to_owned().into(), &text, &ctx()).await.expect("text");
    assert_eq!(body_text(response).await, "hello");

    let response = to_response("hello".to_owned().into(), &ResponseSettings::default(), &ctx()).await.expect("json");
    assert_eq!(body_text(response).await, "\"hello\"");

    let response = to_response(json!({ "ok": true }).into(), &ResponseSettings::default(), &ctx()).await.expect("json");
    assert_eq!(body_json(response).await, json!({ "ok": true }));

    let csv = ResponseSettings::default().media_type(MediaType::Other("text/csv; charset=utf-8".to_owned()));
    let response = to_response(json!("a,b\n1,2").into(), &csv, &ctx()).await.expect("csv");
    assert_eq!(body_text(response).await, "a,b\n1,2");
}

#[tokio::test]
async fn delete_responses_have_no_body() {
    let settings = ResponseSettings::for_method(&Method::DELETE);
    let response = to_response(HandlerOutput::Content(Content::Empty), &settings, &ctx()).await.expect("empty");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn descriptors_send_no_body_under_bodiless_statuses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello file").expect("write");

    let not_modified = ResponseSettings::default().status(StatusCode::NOT_MODIFIED);
    let file = File::new(&path).expect("file");
    let response = to_response(file.into(), &not_modified, &ctx()).await.expect("file");

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(response.headers().contains_key(header::ETAG));
    assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    assert!(body_text(response).await.is_empty());

    let no_content = ResponseSettings::default().status(StatusCode::NO_CONTENT);
    let response = to_response(Stream::new(["a", "b"]).into(), &no_content, &ctx()).await.expect("stream");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn handler_headers_are_appended() {
    let settings =
        ResponseSettings::default().header(HeaderName::from_static("x-request-source"), HeaderValue::from_static("test"));

    let response = to_response(json!([]).into(), &settings, &ctx()).await.expect("json");
    assert_eq!(response.headers()["x-request-source"], "test");

    let response = to_response(Redirect::new("/").into(), &settings, &ctx()).await.expect("redirect");
    assert_eq!(response.headers()["x-request-source"], "test");
}

#[tokio::test]
async fn templates_render_as_html() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("hello.html"), "<p>Hello {{ name }}</p>").expect("write");

    let engine = TemplateConfig::<JinjaEngine>::new([dir.path()]).expect("config").build().expect("engine");
    let ctx = ResponseContext { templates: Some(engine), ..ctx() };

    let template = Template::new("hello.html", json!({ "name": "Spire" }));
    let response = to_response(template.into(), &ResponseSettings::default(), &ctx).await.expect("template");

    assert_eq!(response.headers()[header::CONTENT_TYPE], MediaType::Html.as_str());
    assert_eq!(body_text(response).await, "<p>Hello Spire</p>");
}

#[tokio::test]
async fn templates_require_an_engine() {
    let template = Template::new("hello.html", json!({}));
    let err = to_response(template.into(), &ResponseSettings::default(), &ctx()).await.expect_err("no engine");
    assert!(matches!(err, ResponseError::TemplatesDisabled { .. }));

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["status_code"], 500);
}
