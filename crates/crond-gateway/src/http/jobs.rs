//! Mutation endpoints. Each one holds the manager lock for its whole run.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crond_core::api::{
    CreateOrReplaceRequest, EntryIdResponse, NameRequest, PauseRequest, ScheduleChangeRequest,
};

use crate::{app::AppState, http::error::ApiError};

type Body<T> = Result<Json<T>, JsonRejection>;
type Reply = Result<Json<EntryIdResponse>, ApiError>;

fn reply(entry_id: u64) -> Reply {
    Ok(Json(EntryIdResponse { entry_id }))
}

/// POST /create_or_replace
pub async fn create_or_replace(
    State(state): State<Arc<AppState>>,
    body: Body<CreateOrReplaceRequest>,
) -> Reply {
    let Json(req) = body?;
    let mut manager = state.manager.lock().await;
    reply(manager.create_or_replace(req.job, req.permanent)?)
}

/// POST /delete
pub async fn delete(State(state): State<Arc<AppState>>, body: Body<NameRequest>) -> Reply {
    let Json(req) = body?;
    let mut manager = state.manager.lock().await;
    reply(manager.delete(&req.name, req.permanent)?)
}

/// POST /disable
pub async fn disable(State(state): State<Arc<AppState>>, body: Body<NameRequest>) -> Reply {
    let Json(req) = body?;
    let mut manager = state.manager.lock().await;
    reply(manager.disable(&req.name, req.permanent)?)
}

/// POST /resume
pub async fn resume(State(state): State<Arc<AppState>>, body: Body<NameRequest>) -> Reply {
    let Json(req) = body?;
    let mut manager = state.manager.lock().await;
    reply(manager.resume(&req.name, req.permanent)?)
}

/// POST /pause: `duration` is humantime text (`"90s"`, `"1h 30m"`).
pub async fn pause(State(state): State<Arc<AppState>>, body: Body<PauseRequest>) -> Reply {
    let Json(req) = body?;
    let duration = humantime::parse_duration(req.duration.trim()).map_err(|e| {
        ApiError::bad_request("INVALID_ARGUMENT", format!("duration {:?}: {e}", req.duration))
    })?;
    let mut manager = state.manager.lock().await;
    reply(manager.pause(&req.name, duration)?)
}

/// POST /schedule/change
pub async fn schedule_change(
    State(state): State<Arc<AppState>>,
    body: Body<ScheduleChangeRequest>,
) -> Reply {
    let Json(req) = body?;
    let mut manager = state.manager.lock().await;
    reply(manager.schedule_change(&req.name, &req.schedule, req.permanent)?)
}
