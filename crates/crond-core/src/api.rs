//! Request and response bodies of the crond HTTP control API.
//!
//! Shared by the daemon's handlers and the `crondctl` client so both sides
//! agree on the wire format.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::JobDefine;

/// Scheduler entry handle. `0` means "no entry" (disabled job).
pub type EntryId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrReplaceRequest {
    pub job: JobDefine,
    pub permanent: bool,
}

/// Body of `/delete`, `/disable` and `/resume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: String,
    pub permanent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseRequest {
    pub name: String,
    /// Human-readable duration, e.g. `"30s"`, `"2h"`, `"1h 30m"`.
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleChangeRequest {
    pub name: String,
    pub schedule: String,
    pub permanent: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntryIdResponse {
    pub entry_id: EntryId,
}

/// Which jobs `/entries` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Enabled,
    Disabled,
    All,
}

/// Current state of a job in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Enabled,
    Disabled,
    Paused,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Enabled => "enabled",
            JobStatus::Disabled => "disabled",
            JobStatus::Paused => "paused",
        };
        write!(f, "{s}")
    }
}

/// One row of `/entries`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
    /// Scheduler entry of the job, or of its pause proxy. `0` when disabled.
    pub id: EntryId,
    pub status: JobStatus,
    pub job: JobDefine,
    #[serde(default)]
    pub next: Option<DateTime<Local>>,
    #[serde(default)]
    pub prev: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntriesResponse {
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisabledResponse {
    pub jobs: Vec<JobDefine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPathResponse {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    pub build_timestamp: String,
    pub git_hash: String,
}

/// Error body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_uses_snake_case() {
        let f: StatusFilter = serde_json::from_str(r#""disabled""#).unwrap();
        assert_eq!(f, StatusFilter::Disabled);
        assert_eq!(StatusFilter::default(), StatusFilter::Enabled);
    }

    #[test]
    fn entry_view_omits_nothing_for_disabled_jobs() {
        let view = EntryView {
            id: 0,
            status: JobStatus::Disabled,
            job: JobDefine {
                name: "backup".into(),
                command: "/bin/true".into(),
                args: vec![],
                schedule: "@daily".into(),
                creator: String::new(),
                enable: Some(false),
                work_dir: None,
            },
            next: None,
            prev: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["status"], "disabled");
        assert_eq!(json["job"]["name"], "backup");
        assert!(json["next"].is_null());
    }
}
