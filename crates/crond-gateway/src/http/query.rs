use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use regex::Regex;
use serde::Deserialize;

use crond_core::api::{DisabledResponse, EntriesResponse, StatusFilter};
use crond_manager::EntryFilter;

use crate::{app::AppState, http::error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct EntriesQuery {
    pub name: Option<String>,
    #[serde(rename = "name-match")]
    pub name_match: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
}

/// GET /entries?name=&name-match=&status=
pub async fn entries(
    State(state): State<Arc<AppState>>,
    query: Result<Query<EntriesQuery>, QueryRejection>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let Query(q) = query?;
    let name_match = q
        .name_match
        .filter(|p| !p.is_empty())
        .map(|p| Regex::new(&p))
        .transpose()
        .map_err(|e| ApiError::bad_request("INVALID_QUERY", e))?;
    let filter = EntryFilter {
        name: q.name.filter(|n| !n.is_empty()),
        name_match,
        status: q.status,
    };

    let manager = state.manager.lock().await;
    Ok(Json(EntriesResponse {
        entries: manager.entries(&filter),
    }))
}

/// GET /disabled: disabled and paused jobs.
pub async fn disabled(State(state): State<Arc<AppState>>) -> Json<DisabledResponse> {
    let manager = state.manager.lock().await;
    Json(DisabledResponse {
        jobs: manager.disabled(),
    })
}
