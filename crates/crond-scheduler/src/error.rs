use thiserror::Error;

/// Errors that can occur within the scheduler engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The schedule expression could not be parsed.
    #[error("Invalid schedule '{expr}': {reason}")]
    InvalidSchedule { expr: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
