//! Demo directory of people, exercising every response kind.

mod handlers;
mod model;

pub use model::{PeopleStore, Person, PersonPlugin};

use axum::Extension;
use spire::cache::CacheConfig;
use spire::openapi::{BodyField, create_request_body};
use spire::server::{AppState, cached};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// People routes; the listing is cached with `cache`.
pub(crate) fn router(store: PeopleStore, cache: CacheConfig, create_examples: bool) -> OpenApiRouter<AppState> {
    let listing = cached(OpenApiRouter::new().routes(routes!(handlers::list_people)), cache);

    let mut router = OpenApiRouter::new()
        .merge(listing)
        .routes(routes!(handlers::create_person))
        .routes(routes!(handlers::get_person, handlers::delete_person))
        .routes(routes!(handlers::export_people))
        .routes(routes!(handlers::people_report))
        .routes(routes!(handlers::legacy_directory))
        .layer(Extension(store));

    let body = BodyField::new(PersonPlugin::model()).description("A person, or an array of people, to add");
    if let Some(post) =
        router.get_openapi_mut().paths.paths.get_mut("/people").and_then(|item| item.post.as_mut())
    {
        post.request_body = Some(create_request_body(&body, create_examples));
    }

    router
}
