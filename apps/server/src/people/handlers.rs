use super::model::{PeopleStore, Person, PersonPlugin};
use crate::error::{ApiError, ApiErrorExt};
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::{Value, json};
use spire::plugins::{ModelPlugin, OneOrMany};
use spire::prelude::*;
use spire::response::ResponseError;
use tracing::info;

const LISTING: &str = "/people";

/// Lists every person; responses are cached.
#[utoipa::path(get, path = "/people", tag = "people", responses((status = 200, description = "Every person in the directory")))]
pub(crate) async fn list_people(State(state): State<AppState>, Extension(store): Extension<PeopleStore>) -> Response {
    let people: Vec<DomainValue> = store.all().into_iter().map(DomainValue::new).collect();
    state.respond(people, &ResponseSettings::default()).await
}

/// Adds one person, or several when the body is an array.
#[utoipa::path(
    post,
    path = "/people",
    tag = "people",
    responses(
        (status = 201, description = "The stored people with their assigned ids"),
        (status = 400, description = "The body failed validation"),
    )
)]
pub(crate) async fn create_person(
    State(state): State<AppState>,
    Extension(store): Extension<PeopleStore>,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let decoded = state.responses.plugins.decode(&ModelType::of::<Person>(), payload).context("Person")?;

    let stored = decoded.map(|value| match value.downcast::<Person>() {
        Ok(person) => DomainValue::new(store.insert(person)),
        Err(other) => other,
    });
    state.cache.evict(&Uri::from_static(LISTING));
    info!(count = stored_len(&stored), "People added");

    let settings = ResponseSettings::for_method(&Method::POST);
    Ok(match stored {
        OneOrMany::One(value) => state.respond(value, &settings).await,
        OneOrMany::Many(values) => state.respond(values, &settings).await,
    })
}

#[utoipa::path(
    get,
    path = "/people/{id}",
    tag = "people",
    params(("id" = u32, Path, description = "Person id")),
    responses((status = 200, description = "The person"), (status = 404, description = "Unknown id"))
)]
pub(crate) async fn get_person(
    State(state): State<AppState>,
    Extension(store): Extension<PeopleStore>,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    let person = store.get(id).ok_or_else(|| ApiError::not_found(format!("Person {id}")))?;
    Ok(state.respond(DomainValue::new(person), &ResponseSettings::default()).await)
}

#[utoipa::path(
    delete,
    path = "/people/{id}",
    tag = "people",
    params(("id" = u32, Path, description = "Person id")),
    responses((status = 204, description = "Removed"), (status = 404, description = "Unknown id"))
)]
pub(crate) async fn delete_person(
    State(state): State<AppState>,
    Extension(store): Extension<PeopleStore>,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    store.remove(id).ok_or_else(|| ApiError::not_found(format!("Person {id}")))?;
    state.cache.evict(&Uri::from_static(LISTING));

    Ok(state.respond(Content::Empty, &ResponseSettings::for_method(&Method::DELETE)).await)
}

/// Streams the directory as CSV, one chunk per row.
#[utoipa::path(get, path = "/people/export", tag = "people", responses((status = 200, description = "CSV export", content_type = "text/csv")))]
pub(crate) async fn export_people(State(state): State<AppState>, Extension(store): Extension<PeopleStore>) -> Response {
    let rows = std::iter::once("id,first_name,last_name,age\n".to_owned()).chain(
        store.all().into_iter().map(|p| format!("{},{},{},{}\n", p.id, p.first_name, p.last_name, p.age)),
    );

    let settings = ResponseSettings::default()
        .media_type(MediaType::Other("text/csv; charset=utf-8".to_owned()))
        .header(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline; filename=\"people.csv\""));
    state.respond(Stream::new(rows), &settings).await
}

/// Renders the directory with the `people.html` template.
#[utoipa::path(get, path = "/people/report", tag = "people", responses((status = 200, description = "HTML report", content_type = "text/html")))]
pub(crate) async fn people_report(State(state): State<AppState>, Extension(store): Extension<PeopleStore>) -> Response {
    let plugin = PersonPlugin;
    let rows = store
        .all()
        .into_iter()
        .map(|person| plugin.to_dict(&DomainValue::new(person)).map(Value::Object))
        .collect::<Result<Vec<_>, _>>();

    match rows {
        Ok(people) => {
            let template = Template::new("people.html", json!({ "title": "People", "people": people }));
            state.respond(template, &ResponseSettings::default()).await
        }
        Err(err) => ResponseError::from(err).into_response(),
    }
}

/// Old listing location, permanently moved.
#[utoipa::path(get, path = "/directory", tag = "people", responses((status = 301, description = "Moved to /people")))]
pub(crate) async fn legacy_directory(State(state): State<AppState>) -> Response {
    let settings = ResponseSettings::default().status(StatusCode::MOVED_PERMANENTLY);
    state.respond(Redirect::new(LISTING), &settings).await
}

fn stored_len(stored: &OneOrMany<DomainValue>) -> usize {
    match stored {
        OneOrMany::One(_) => 1,
        OneOrMany::Many(values) => values.len(),
    }
}
