use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bookshelf::config::Settings;
use bookshelf::error::{BookshelfError, Result};
use bookshelf::interface::CatalogInterface;
use bookshelf::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_file = std::env::var_os("BOOKSHELF_CONFIG").map(PathBuf::from);
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                config_file = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--help" | "-h" => {
                eprintln!("Usage: {} [--config <path>]", args[0]);
                return Ok(());
            }
            _ => {
                i += 1;
            }
        }
    }

    let settings = Settings::load(config_file.as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();
    tracing::info!("bookshelf {} starting", env!("CARGO_PKG_VERSION"));

    let interface = Arc::new(CatalogInterface::new(&settings.catalog)?);
    if let Err(e) = interface.reload().await {
        if settings.catalog.require_on_startup {
            return Err(e.into());
        }
        tracing::warn!("serving without a catalog until a reload succeeds");
    }

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| BookshelfError::Config(format!("invalid bind address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, server::router(interface))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
