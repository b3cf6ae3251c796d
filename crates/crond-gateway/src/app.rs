use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::{Mutex, Notify};

use crond_beat::Sink;
use crond_manager::JobManager;

use crate::http;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    /// The job table. This lock is the process-wide mutation lock: every
    /// handler that touches the table holds it for the whole request.
    pub manager: Mutex<JobManager>,
    pub sink: Arc<dyn Sink>,
    /// Signalled by `/quit`; the server loop exits when it fires.
    pub quit: Notify,
}

impl AppState {
    pub fn new(manager: JobManager, sink: Arc<dyn Sink>) -> Self {
        Self {
            manager: Mutex::new(manager),
            sink,
            quit: Notify::new(),
        }
    }
}

/// Assemble the control API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create_or_replace", post(http::jobs::create_or_replace))
        .route("/delete", post(http::jobs::delete))
        .route("/disable", post(http::jobs::disable))
        .route("/resume", post(http::jobs::resume))
        .route("/pause", post(http::jobs::pause))
        .route("/schedule/change", post(http::jobs::schedule_change))
        .route("/entries", get(http::query::entries))
        .route("/disabled", get(http::query::disabled))
        .route("/config/jobs-config", get(http::admin::jobs_config))
        .route("/config/reload", get(http::admin::reload))
        .route("/version", get(http::admin::version))
        .route("/quit", get(http::admin::quit))
        .route("/beat/event", post(http::beat::event))
        .route("/beat/metrics", post(http::beat::metrics))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
