//! HTTP control surface
//!
//! Thin warp glue over the sync core: health, config get/update, clipboard
//! read, manual sync, status, and the static WebUI. Handlers never panic;
//! failures come back as JSON error bodies with the matching status code.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::clipboard::ClipboardAccessor;
use crate::config::SyncConfig;
use crate::remote::{RemoteStore, WebDavStore};
use crate::sync::SyncManager;

/// Shared state injected into every request handler
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SyncManager>,
    pub accessor: Arc<ClipboardAccessor>,
    pub config_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(
        manager: Arc<SyncManager>,
        accessor: Arc<ClipboardAccessor>,
        config_path: PathBuf,
    ) -> Self {
        Self {
            manager,
            accessor,
            config_path: Arc::new(config_path),
        }
    }
}

/// Build the full route tree
pub fn routes(
    state: AppState,
    webui_dir: PathBuf,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    health()
        .or(config_get(state.clone()))
        .or(config_update(state.clone()))
        .or(clipboard_get(state.clone()))
        .or(sync_now(state.clone()))
        .or(sync_status(state))
        .or(warp::get().and(warp::fs::dir(webui_dir)))
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_reply(status: StatusCode, value: serde_json::Value) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&value), status)
}

fn error_reply(status: StatusCode, message: &str) -> WithStatus<Json> {
    json_reply(status, json!({ "error": message }))
}

/// GET /health
fn health() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })))
}

/// GET /api/config
fn config_get(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "config")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_config_get)
}

async fn handle_config_get(state: AppState) -> Result<impl Reply, Infallible> {
    let config = SyncConfig::load(&state.config_path).unwrap_or_else(|e| {
        warn!("failed to load config, returning defaults: {e}");
        SyncConfig::default()
    });

    Ok(warp::reply::json(&config))
}

/// POST /api/config
fn config_update(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "config")
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handle_config_update)
}

async fn handle_config_update(body: Bytes, state: AppState) -> Result<impl Reply, Infallible> {
    let config: SyncConfig = match serde_json::from_slice(&body) {
        Ok(config) => config,
        Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, &e.to_string())),
    };

    if let Err(e) = config.validate() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, &e.to_string()));
    }

    if let Err(e) = config.save(&state.config_path) {
        return Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        ));
    }

    let remote: Option<Arc<dyn RemoteStore>> = if config.webdav_url.is_empty() {
        None
    } else {
        match WebDavStore::new(
            &config.webdav_url,
            &config.webdav_username,
            &config.webdav_password,
        ) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                return Ok(error_reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &e.to_string(),
                ))
            }
        }
    };

    state.manager.reconfigure(config, remote).await;
    info!("configuration updated");

    Ok(json_reply(StatusCode::OK, json!({ "status": "ok" })))
}

/// GET /api/clipboard
fn clipboard_get(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "clipboard")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_clipboard_get)
}

async fn handle_clipboard_get(state: AppState) -> Result<impl Reply, Infallible> {
    match state.accessor.read().await {
        Ok(content) => Ok(json_reply(StatusCode::OK, json!({ "content": content }))),
        Err(e) => Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        )),
    }
}

/// GET /api/sync/now
fn sync_now(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "sync" / "now")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_sync_now)
}

async fn handle_sync_now(state: AppState) -> Result<impl Reply, Infallible> {
    match state.manager.sync_now().await {
        Ok(()) => Ok(json_reply(StatusCode::OK, json!({ "status": "synced" }))),
        Err(e) => Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        )),
    }
}

/// GET /api/sync/status
fn sync_status(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "sync" / "status")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_sync_status)
}

async fn handle_sync_status(state: AppState) -> Result<impl Reply, Infallible> {
    let running = state.manager.is_running().await;
    Ok(warp::reply::json(&json!({ "running": running })))
}
