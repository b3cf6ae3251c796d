//! Forwarding of events and metrics from local tools to the monitoring sink.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crond_beat::{Event, Metric};

use crate::{app::AppState, http::error::ApiError};

/// POST /beat/event: `{name, content, dimension}`
pub async fn event(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Event>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(event) = body?;
    state.sink.send_event(&event).await?;
    Ok(Json(json!({})))
}

/// POST /beat/metrics: `{name, value, dimension}`
pub async fn metrics(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Metric>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(metric) = body?;
    state.sink.send_metric(&metric).await?;
    Ok(Json(json!({})))
}
