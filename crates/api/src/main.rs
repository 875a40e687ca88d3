//! Auspex - local mirror of EVE Online industry data
//!
//! Main entry point for the HTTP server.

use std::path::PathBuf;

use anyhow::Context as _;
use auspex_api::utils::logging::{init_tracing, LogFormat};
use auspex_api::AppContext;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Auspex ESI mirror")]
struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(short, long, env = "AUSPEX_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap so AUSPEX_CONFIG can come from it
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing(LogFormat::from_env())
        .map_err(|err| anyhow::anyhow!("failed to initialise logging: {err}"))?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "Could not load .env file"),
    }

    let config = auspex_infra::config::load(cli.config).context("failed to load configuration")?;
    let address = format!("0.0.0.0:{}", config.server.port);

    let ctx = AppContext::new(config).await.context("failed to start Auspex")?;
    let app = ctx.router();

    let listener =
        TcpListener::bind(&address).await.with_context(|| format!("failed to bind {address}"))?;
    info!("Listening on http://{address}");

    let shutdown = ctx.shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server error")?;

    ctx.shutdown().await.context("shutdown failed")?;
    info!("Auspex stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or when something else cancels the root token.
async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                warn!(error = %err, "Failed to listen for Ctrl-C");
            }
            token.cancel();
        }
        () = token.cancelled() => {}
    }
}
