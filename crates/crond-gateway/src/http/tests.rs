use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crond_beat::MemorySink;
use crond_manager::{ConfigStore, JobManager, Launcher};
use crond_scheduler::Engine;

use crate::app::{build_router, AppState};

struct Harness {
    _dir: tempfile::TempDir,
    state: Arc<AppState>,
    sink: Arc<MemorySink>,
    router: Router,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::open(dir.path().join("jobs-config.toml")).unwrap();
    let sink = Arc::new(MemorySink::new());
    let manager = JobManager::new(
        Engine::new(),
        store,
        Launcher::new(sink.clone(), None),
        false,
    );
    let state = Arc::new(AppState::new(manager, sink.clone()));
    Harness {
        _dir: dir,
        router: build_router(state.clone()),
        state,
        sink,
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn backup(enable: bool) -> Value {
    json!({
        "name": "backup",
        "command": "/bin/true",
        "args": [],
        "schedule": "*/5 * * * * *",
        "creator": "dba",
        "enable": enable,
    })
}

fn entry_names(body: &Value) -> Vec<String> {
    body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["job"]["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn backup_scenario_over_http() {
    let h = harness();

    let (status, body) = call(
        &h.router,
        "POST",
        "/create_or_replace",
        Some(json!({"job": backup(true), "permanent": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["entry_id"].as_u64().unwrap() > 0);

    let (_, body) = call(&h.router, "GET", "/entries", None).await;
    assert_eq!(entry_names(&body), vec!["backup"]);
    assert_eq!(body["entries"][0]["status"], "enabled");

    let (status, _) = call(
        &h.router,
        "POST",
        "/disable",
        Some(json!({"name": "backup", "permanent": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&h.router, "GET", "/entries?status=enabled", None).await;
    assert!(entry_names(&body).is_empty());
    let (_, body) = call(&h.router, "GET", "/disabled", None).await;
    assert_eq!(body["jobs"][0]["name"], "backup");

    let (status, body) = call(&h.router, "GET", "/config/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    let (_, body) = call(&h.router, "GET", "/disabled", None).await;
    assert_eq!(body["jobs"].as_array().unwrap().len(), 1);
    let (_, body) = call(&h.router, "GET", "/entries", None).await;
    assert!(entry_names(&body).is_empty());

    h.state.manager.lock().await.engine().stop();
}

#[tokio::test]
async fn unknown_job_is_a_server_error_with_code() {
    let h = harness();
    let (status, body) = call(
        &h.router,
        "POST",
        "/delete",
        Some(json!({"name": "ghost", "permanent": true})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let h = harness();

    let (status, body) = call(&h.router, "POST", "/disable", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");

    let mut job = backup(true);
    job.as_object_mut().unwrap().remove("enable");
    let (status, body) = call(
        &h.router,
        "POST",
        "/create_or_replace",
        Some(json!({"job": job, "permanent": false})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JOB");

    let (status, body) = call(
        &h.router,
        "POST",
        "/pause",
        Some(json!({"name": "backup", "duration": "soon"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn pause_and_schedule_change() {
    let h = harness();
    call(
        &h.router,
        "POST",
        "/create_or_replace",
        Some(json!({"job": backup(true), "permanent": false})),
    )
    .await;

    let (status, body) = call(
        &h.router,
        "POST",
        "/schedule/change",
        Some(json!({"name": "backup", "schedule": "@hourly", "permanent": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["entry_id"].as_u64().unwrap() > 0);

    let (status, _) = call(
        &h.router,
        "POST",
        "/pause",
        Some(json!({"name": "backup", "duration": "1h"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&h.router, "GET", "/entries?status=all", None).await;
    assert_eq!(body["entries"][0]["status"], "paused");
    assert_eq!(body["entries"][0]["job"]["schedule"], "@hourly");
    assert!(body["entries"][0]["next"].is_string());

    let (status, _) = call(
        &h.router,
        "POST",
        "/resume",
        Some(json!({"name": "backup", "permanent": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&h.router, "GET", "/entries", None).await;
    assert_eq!(body["entries"][0]["status"], "enabled");
}

#[tokio::test]
async fn entries_filters() {
    let h = harness();
    for (name, enable) in [("backup-db", true), ("backup-logs", false), ("rotate", true)] {
        let mut job = backup(enable);
        job["name"] = json!(name);
        call(
            &h.router,
            "POST",
            "/create_or_replace",
            Some(json!({"job": job, "permanent": false})),
        )
        .await;
    }

    let (_, body) = call(&h.router, "GET", "/entries?status=all&name-match=%5Ebackup", None).await;
    assert_eq!(entry_names(&body), vec!["backup-db", "backup-logs"]);
    let (_, body) = call(&h.router, "GET", "/entries?name=rotate", None).await;
    assert_eq!(entry_names(&body), vec!["rotate"]);
    let (_, body) = call(&h.router, "GET", "/entries?status=disabled", None).await;
    assert_eq!(entry_names(&body), vec!["backup-logs"]);

    let (status, _) = call(&h.router, "GET", "/entries?status=sideways", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&h.router, "GET", "/entries?name-match=(", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn admin_endpoints() {
    let h = harness();

    let (_, body) = call(&h.router, "GET", "/config/jobs-config", None).await;
    assert!(body["path"].as_str().unwrap().ends_with("jobs-config.toml"));

    let (_, body) = call(&h.router, "GET", "/version", None).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());

    let (status, body) = call(&h.router, "GET", "/quit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    tokio::time::timeout(std::time::Duration::from_secs(2), h.state.quit.notified())
        .await
        .unwrap();
}

#[tokio::test]
async fn beat_payloads_reach_the_sink() {
    let h = harness();

    let (status, _) = call(
        &h.router,
        "POST",
        "/beat/event",
        Some(json!({"name": "disk_full", "content": "/data at 97%", "dimension": {"host": "db1"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(
        &h.router,
        "POST",
        "/beat/metrics",
        Some(json!({"name": "backup_size", "value": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].dimension["host"], "db1");
    assert_eq!(h.sink.metrics()[0].value, 42);

    let (status, _) = call(&h.router, "POST", "/beat/metrics", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
