use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crond_core::api::{ConfigPathResponse, VersionResponse};

use crate::{app::AppState, http::error::ApiError};

/// Time given to the `/quit` response to reach the client before the server
/// loop is torn down.
const QUIT_DELAY: Duration = Duration::from_millis(200);

/// GET /config/jobs-config: where the jobs document lives.
pub async fn jobs_config(State(state): State<Arc<AppState>>) -> Json<ConfigPathResponse> {
    let manager = state.manager.lock().await;
    Json(ConfigPathResponse {
        path: manager.config_path().display().to_string(),
    })
}

/// GET /config/reload: rebuild the job table from the document on disk.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state.manager.lock().await.reload()?;
    Ok(Json(json!({})))
}

/// GET /version
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_timestamp: env!("CROND_BUILD_TIMESTAMP").to_string(),
        git_hash: env!("CROND_GIT_SHA").to_string(),
    })
}

/// GET /quit: answer, then stop the daemon.
pub async fn quit(State(state): State<Arc<AppState>>) -> Json<Value> {
    info!("quit requested");
    tokio::spawn(async move {
        tokio::time::sleep(QUIT_DELAY).await;
        state.quit.notify_one();
    });
    Json(json!({}))
}
