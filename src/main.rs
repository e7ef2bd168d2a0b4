//! Syncboard - clipboard to WebDAV synchronization server
//!
//! This is the main entry point for the syncboard daemon.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use syncboard::cli::Cli;
use syncboard::clipboard::ClipboardAccessor;
use syncboard::config::{self, SyncConfig};
use syncboard::remote::{RemoteStore, WebDavStore};
use syncboard::server::{self, AppState};
use syncboard::sync::SyncManager;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("syncboard={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Syncboard v{}", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.unwrap_or_else(config::default_path);
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {:?}", parent))?;
    }

    let cfg = match SyncConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("failed to load config, using defaults: {e}");
            let cfg = SyncConfig::default();
            if let Err(e) = cfg.save(&config_path) {
                warn!("failed to persist default config: {e}");
            }
            cfg
        }
    };

    let accessor = Arc::new(ClipboardAccessor::android());

    let remote: Option<Arc<dyn RemoteStore>> = if cfg.webdav_url.is_empty() {
        None
    } else {
        match WebDavStore::new(&cfg.webdav_url, &cfg.webdav_username, &cfg.webdav_password) {
            Ok(store) => {
                info!("WebDAV store initialized");
                let store = Arc::new(store);
                let probe = Arc::clone(&store);
                tokio::spawn(async move {
                    if let Err(e) = probe.test_connection().await {
                        warn!("WebDAV connection test failed: {e}");
                    }
                });
                Some(store)
            }
            Err(e) => {
                warn!("failed to initialize WebDAV store: {e}");
                None
            }
        }
    };

    let manager = Arc::new(SyncManager::new(cfg.clone(), remote, Arc::clone(&accessor)));
    if cfg.enabled {
        manager.start().await;
    }

    let webui_dir = cli.webui.unwrap_or_else(|| {
        config_path
            .parent()
            .map(|dir| dir.join("webui"))
            .unwrap_or_else(|| PathBuf::from("webui"))
    });

    let state = AppState::new(Arc::clone(&manager), accessor, config_path.clone());
    let routes = server::routes(state, webui_dir.clone());

    let shutdown_manager = Arc::clone(&manager);
    let (addr, serving) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], cli.port), async move {
            shutdown_signal().await;
            info!("shutting down");
            shutdown_manager.stop().await;
        })
        .with_context(|| format!("failed to bind port {}", cli.port))?;

    info!("listening on http://{addr}");
    info!("config: {:?}", config_path);
    info!("webui: {:?}", webui_dir);
    info!("auto-sync: {}", cfg.enabled);

    serving.await;

    Ok(())
}

/// Resolve on SIGTERM or Ctrl-C
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}
