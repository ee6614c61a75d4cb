use anyhow::Context;
use spire::config::load_app_config;
use spire_logger::Logger;
use spire_server::Server;

/// Reads `SPIRE_CONFIG` (a config file path) when set, else an optional `spire.toml`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("SPIRE_CONFIG");
    let cfg = load_app_config(config_path.as_deref()).context("Critical: Configuration is malformed")?;

    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &cfg.logging)?.init()?;

    Server::builder().config(cfg).build()?.run().await
}
