use std::path::PathBuf;

use thiserror::Error;

use crond_core::CoreError;
use crond_scheduler::SchedulerError;

/// Errors returned by job table mutations.
#[derive(Debug, Error)]
pub enum JobError {
    /// A job with this name is already active, disabled or paused.
    #[error("job {name} already exists")]
    Duplicate { name: String },

    /// The job is not in the set the operation requires.
    #[error("job {name} not found among {scope}")]
    NotFound { name: String, scope: &'static str },

    /// The definition is missing required fields.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The schedule expression was rejected by the scheduler.
    #[error(transparent)]
    Registration(#[from] SchedulerError),

    /// An argument other than the job definition is unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading or writing the jobs document failed.
    #[error("jobs config {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },
}

impl JobError {
    /// Short error code string returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            JobError::Duplicate { .. } => "DUPLICATE_JOB",
            JobError::NotFound { .. } => "NOT_FOUND",
            JobError::Invalid(_) => "INVALID_JOB",
            JobError::Registration(_) => "INVALID_SCHEDULE",
            JobError::InvalidArgument(_) => "INVALID_ARGUMENT",
            JobError::Persistence { .. } => "PERSISTENCE_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, JobError::NotFound { .. })
    }

    pub(crate) fn not_found(name: &str, scope: &'static str) -> Self {
        JobError::NotFound {
            name: name.to_string(),
            scope,
        }
    }

    pub(crate) fn persistence(path: &std::path::Path, reason: impl ToString) -> Self {
        JobError::Persistence {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JobError>;
