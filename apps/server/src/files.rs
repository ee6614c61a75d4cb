use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::response::Response;
use spire::prelude::*;
use spire::response::DescriptorError;
use tracing::warn;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub(crate) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(download))
}

/// Sends a file from the static directories as an attachment.
#[utoipa::path(
    get,
    path = "/files/{name}",
    tag = "files",
    params(("name" = String, Path, description = "Plain file name, no directories")),
    responses((status = 200, description = "The file"), (status = 404, description = "No such file"))
)]
pub(crate) async fn download(State(state): State<AppState>, Path(name): Path<String>) -> Result<Response, ApiError> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(ApiError::not_found(format!("File {name}")));
    }

    let found = state
        .config
        .static_files
        .iter()
        .flat_map(|mount| &mount.directories)
        .map(|directory| directory.join(&name))
        .find_map(|path| match File::new(path) {
            Ok(file) => Some(file),
            Err(DescriptorError::Io { .. }) => None,
            Err(err) => {
                warn!(error = %err, "Skipping download candidate");
                None
            }
        });

    let file = found.ok_or_else(|| ApiError::not_found(format!("File {name}")))?;
    Ok(state.respond(file, &ResponseSettings::default()).await)
}
