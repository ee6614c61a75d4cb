use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use spire::domain::config::{AppConfig, StaticFilesConfig, TemplateSettings};
use spire_server::{PeopleStore, Server};
use tempfile::TempDir;
use tower::ServiceExt;

struct Fixture {
    app: Router,
    _assets: TempDir,
}

fn fixture() -> Fixture {
    let assets = tempfile::tempdir().expect("tempdir");
    let templates = assets.path().join("templates");
    let public = assets.path().join("public");
    std::fs::create_dir_all(&templates).expect("templates dir");
    std::fs::create_dir_all(&public).expect("public dir");
    std::fs::write(
        templates.join("people.html"),
        "{% for person in people %}<li>{{ person.first_name }}</li>{% endfor %}",
    )
    .expect("template");
    std::fs::write(public.join("manual.txt"), "read me").expect("asset");

    let mut config = AppConfig::default();
    config.templates = Some(TemplateSettings { directories: vec![templates], ..TemplateSettings::default() });
    config.static_files = vec![StaticFilesConfig { path: "/site".to_owned(), directories: vec![public], html_mode: false }];

    let app = Server::builder().config(config).store(PeopleStore::seeded()).build().expect("server").into_router();
    Fixture { app, _assets: assets }
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("infallible")
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}

async fn json_body(response: Response) -> Value {
    serde_json::from_str(&text(response).await).expect("json")
}

#[tokio::test]
async fn lists_people_through_the_plugin() {
    let fx = fixture();
    let response = send(&fx.app, request(Method::GET, "/people", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let people = json_body(response).await;
    assert_eq!(people.as_array().map(Vec::len), Some(3));
    assert_eq!(people[0], json!({ "id": 1, "first_name": "Ada", "last_name": "Lovelace", "age": 36 }));
}

#[tokio::test]
async fn create_validates_and_invalidates_the_listing() {
    let fx = fixture();
    assert_eq!(json_body(send(&fx.app, request(Method::GET, "/people", None)).await).await.as_array().map(Vec::len), Some(3));

    let created = send(
        &fx.app,
        request(Method::POST, "/people", Some(json!({ "first_name": "Edsger", "last_name": "Dijkstra", "age": 72 }))),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(json_body(created).await["id"], 4);

    let listing = json_body(send(&fx.app, request(Method::GET, "/people", None)).await).await;
    assert_eq!(listing.as_array().map(Vec::len), Some(4));

    let rejected = send(&fx.app, request(Method::POST, "/people", Some(json!({ "first_name": "Nobody" })))).await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(rejected).await["detail"].as_str().is_some_and(|d| d.contains("last_name")));
}

#[tokio::test]
async fn bulk_create_returns_an_array() {
    let fx = fixture();
    let payload = json!([
        { "first_name": "Barbara", "last_name": "Liskov", "age": 84 },
        { "first_name": "Donald", "last_name": "Knuth", "age": 86 },
    ]);

    let response = send(&fx.app, request(Method::POST, "/people", Some(payload))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let ids: Vec<_> = json_body(response).await.as_array().expect("array").iter().map(|p| p["id"].clone()).collect();
    assert_eq!(ids, [json!(4), json!(5)]);
}

#[tokio::test]
async fn get_and_delete_by_id() {
    let fx = fixture();

    let found = send(&fx.app, request(Method::GET, "/people/2", None)).await;
    assert_eq!(json_body(found).await["last_name"], "Turing");

    let deleted = send(&fx.app, request(Method::DELETE, "/people/2", None)).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert!(text(deleted).await.is_empty());

    let missing = send(&fx.app, request(Method::GET, "/people/2", None)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await["status_code"], 404);
}

#[tokio::test]
async fn legacy_directory_redirects_permanently() {
    let fx = fixture();
    let response = send(&fx.app, request(Method::GET, "/directory", None)).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/people");
}

#[tokio::test]
async fn export_streams_csv_rows() {
    let fx = fixture();
    let response = send(&fx.app, request(Method::GET, "/people/export", None)).await;

    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let csv = text(response).await;
    assert_eq!(csv.lines().next(), Some("id,first_name,last_name,age"));
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test]
async fn report_renders_the_template() {
    let fx = fixture();
    let response = send(&fx.app, request(Method::GET, "/people/report", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "<li>Ada</li><li>Alan</li><li>Grace</li>");
}

#[tokio::test]
async fn downloads_come_from_static_directories() {
    let fx = fixture();

    let response = send(&fx.app, request(Method::GET, "/files/manual.txt", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "attachment; filename=\"manual.txt\"");
    assert_eq!(text(response).await, "read me");

    let hidden = send(&fx.app, request(Method::GET, "/files/..%2Fsecret", None)).await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let served = send(&fx.app, request(Method::GET, "/site/manual.txt", None)).await;
    assert_eq!(text(served).await, "read me");
}

#[tokio::test]
async fn openapi_documents_the_request_body() {
    let fx = fixture();
    let document = json_body(send(&fx.app, request(Method::GET, "/schema/openapi.json", None)).await).await;

    let body = &document["paths"]["/people"]["post"]["requestBody"];
    assert_eq!(body["required"], true);
    assert_eq!(body["content"]["application/json"]["schema"]["required"], json!(["first_name", "last_name", "age"]));
    assert!(document["paths"]["/people"]["get"].is_object());
}
