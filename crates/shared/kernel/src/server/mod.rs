//! HTTP plumbing: application state, configured layers and router assembly.

mod cache;
mod docs;
mod layers;
mod router;
mod state;
mod static_files;

pub use cache::cached;
pub use docs::openapi_router;
pub use layers::{compression_layer, cors_layer};
pub use router::{RouterError, RouterErrorExt, build_router};
pub use state::{AppState, AppStateBuilder, AppStateError, AppStateErrorExt, AppStateInner};
pub use static_files::static_files_router;
