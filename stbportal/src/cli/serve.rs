use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{signal, sync::watch};

use crate::device::{DeviceRegistry, FileRegistry, MemoryRegistry};
use crate::playlist::{CatalogCache, open_source};
use crate::portal::Portal;
use crate::server::{AppState, PORTAL_PATHS};
use crate::util::random::RandomTokens;

pub const DEFAULT_PLAYLIST_URL: &str = "https://tvpass.org/playlist/m3u";
const MEMORY_REGISTRY: &str = ":memory:";

#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// HTTP server port
    #[arg(short, long, env = "STBPORTAL_PORT", default_value = "8099")]
    pub port: u16,

    /// Upstream M3U playlist (URL or local path)
    #[arg(short = 'u', long, env = "STBPORTAL_PLAYLIST_URL", default_value = DEFAULT_PLAYLIST_URL)]
    pub playlist_url: String,

    /// Device registry file, or `:memory:` for a volatile one; without it
    /// every device is treated as registered
    #[arg(short, long, env = "STBPORTAL_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Upstream fetch timeout in seconds
    #[arg(long, env = "STBPORTAL_FETCH_TIMEOUT", default_value = "15")]
    pub fetch_timeout: u64,

    /// Seconds a fetched playlist is reused (0 = fetch on every listing)
    #[arg(long, env = "STBPORTAL_REFRESH_INTERVAL", default_value = "300")]
    pub refresh_interval: u64,

    /// Proxy for upstream playlist requests (http, https or socks5 URL)
    #[arg(long, env = "STBPORTAL_PROXY")]
    pub proxy: Option<String>,
}

impl ServeCommand {
    pub async fn run(self) -> Result<()> {
        // Shutdown signal
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let registry: Option<Arc<dyn DeviceRegistry>> = match &self.registry {
            Some(path) if path.as_os_str() == MEMORY_REGISTRY => {
                Some(Arc::new(MemoryRegistry::new()))
            }
            Some(path) => {
                let registry = FileRegistry::open(path).await.with_context(|| {
                    format!("Failed to open device registry {}", path.display())
                })?;
                Some(Arc::new(registry))
            }
            None => None,
        };

        let source = open_source(
            &self.playlist_url,
            Duration::from_secs(self.fetch_timeout),
            self.proxy.as_deref(),
        )
        .context("Failed to set up playlist source")?;

        let catalog = Arc::new(CatalogCache::new(
            source,
            Duration::from_secs(self.refresh_interval),
        ));

        let registry_label = registry
            .as_ref()
            .map(|r| r.describe())
            .unwrap_or_else(|| "none (all devices allowed)".to_string());

        let portal = Arc::new(Portal::new(registry, catalog, Arc::new(RandomTokens)));

        tracing::info!(
            playlist = %self.playlist_url,
            registry = %registry_label,
            refresh_interval = self.refresh_interval,
            "Starting portal"
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        for path in PORTAL_PATHS {
            tracing::info!("  portal: http://localhost:{}{}", self.port, path);
        }

        let server_handle = {
            let state = AppState { portal };
            tokio::spawn(async move {
                if let Err(e) = crate::server::run_server(addr, state, shutdown_rx).await {
                    tracing::error!(error = %e, "Server error");
                }
            })
        };

        // Wait for Ctrl+C
        signal::ctrl_c().await?;
        tracing::info!("Shutting down...");
        let _ = shutdown_tx.send(true);

        let _ = server_handle.await;

        tracing::info!("Done.");
        Ok(())
    }
}
