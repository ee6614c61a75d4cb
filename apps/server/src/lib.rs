//! # Spire Server
//!
//! Demo web server built on `Axum` and the Spire kernel: plugin-serialized models,
//! redirects, file downloads, streams, templates and a cached listing.
//!
//! ## Example
//! ```no_run
//! use spire_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(8000)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

mod error;
mod files;
mod people;
mod router;

pub use error::{ApiError, ApiErrorExt};
pub use people::{PeopleStore, Person, PersonPlugin};

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use spire::domain::config::AppConfig;
use spire::plugins::PluginRegistry;
use spire::server::AppState;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: AppConfig,
    store: Option<PeopleStore>,
}

impl ServerBuilder {
    pub fn config(mut self, cfg: AppConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Starts from `store` instead of the seeded demo directory.
    pub fn store(mut self, store: PeopleStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Consumes the builder and assembles state and router.
    ///
    /// # Errors
    /// Returns an error if the cache or template engine cannot be built from the
    /// configuration, or a layer section (CORS, gzip) is invalid.
    pub fn build(self) -> Result<Server> {
        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, "Initializing server");

        let plugins = PluginRegistry::builder().register(PersonPlugin).build();
        let state = AppState::builder()
            .config(self.cfg)
            .plugins(plugins)
            .build()
            .context("Failed to build application state")?;

        let store = self.store.unwrap_or_else(PeopleStore::seeded);
        let app = router::init(state.clone(), store).context("Failed to build router")?;

        Ok(Server { state, app })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: AppState,
    app: Router,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Serves until Ctrl+C or SIGTERM, then drains connections for up to
    /// `server.shutdown_grace` seconds.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind to the configured address.
    pub async fn run(self) -> Result<()> {
        let server = &self.state.config.server;
        let address = SocketAddr::new(server.address, server.port);
        let grace = Duration::from_secs(server.shutdown_grace);

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!(grace = ?grace, "Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        info!("Starting HTTP server on http://{address}");
        axum_server::bind(address)
            .handle(handle)
            .serve(self.app.into_make_service())
            .await
            .context("HTTP server failed")?;

        info!("Server shutdown complete");
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// The assembled router, for serving elsewhere or driving in tests.
    pub fn into_router(self) -> Router {
        self.app
    }
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
