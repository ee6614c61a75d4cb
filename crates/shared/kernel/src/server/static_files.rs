use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use spire_domain::config::StaticFilesConfig;
use std::convert::Infallible;
use std::path::PathBuf;
use tower::ServiceExt;
use tower::service_fn;
use tower::util::BoxCloneSyncService;
use tower_http::services::{ServeDir, ServeFile};
use tracing::debug;

const NOT_FOUND_PAGE: &str = "404.html";

type FileService = BoxCloneSyncService<Request, Response, Infallible>;

/// Serves `mount.directories` under `mount.path`, first directory wins.
///
/// In HTML mode directories resolve to their `index.html` and misses render the
/// first `404.html` found, with a `404` status.
pub fn static_files_router<S>(mount: &StaticFilesConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    debug!(path = %mount.path, directories = ?mount.directories, html = mount.html_mode, "Mounting static files");
    let service = directory_chain(&mount.directories, mount.html_mode);

    if mount.path == "/" { Router::new().fallback_service(service) } else { Router::new().nest_service(&mount.path, service) }
}

fn directory_chain(directories: &[PathBuf], html_mode: bool) -> FileService {
    let not_found = html_mode
        .then(|| directories.iter().map(|dir| dir.join(NOT_FOUND_PAGE)).find(|page| page.is_file()))
        .flatten();

    let mut chain: Option<FileService> = None;
    for directory in directories.iter().rev() {
        let serve = ServeDir::new(directory).append_index_html_on_directories(html_mode);

        chain = Some(match (chain, &not_found) {
            (Some(next), _) => boxed(serve.fallback(next)),
            (None, Some(page)) => boxed(serve.not_found_service(ServeFile::new(page))),
            (None, None) => boxed(serve),
        });
    }

    chain.unwrap_or_else(|| boxed(service_fn(|_: Request| async { Ok::<_, Infallible>(StatusCode::NOT_FOUND.into_response()) })))
}

fn boxed<T, B>(service: T) -> FileService
where
    T: tower::Service<Request, Response = axum::http::Response<B>, Error = Infallible> + Clone + Send + Sync + 'static,
    T::Future: Send + 'static,
    B: axum::body::HttpBody<Data = axum::body::Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    BoxCloneSyncService::new(service.map_response(|response| response.map(Body::new)))
}
