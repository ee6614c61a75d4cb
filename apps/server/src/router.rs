use crate::{files, people};
use axum::Router;
use spire::server::{AppState, RouterError, build_router};
use utoipa_axum::router::OpenApiRouter;

pub(crate) fn init(state: AppState, store: people::PeopleStore) -> Result<Router, RouterError> {
    let create_examples = state.config.openapi.create_examples;

    let routes = OpenApiRouter::new()
        .merge(people::router(store, state.cache.clone(), create_examples))
        .merge(files::router());

    build_router(state, routes)
}
