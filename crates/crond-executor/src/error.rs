//! Error types for the crond-executor crate.

use thiserror::Error;

/// Failures of a single job execution. Never returned to API callers; they
/// are logged and sent to the monitoring sink.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The child process could not be started.
    #[error("launch failed: {0}")]
    Spawn(#[source] std::io::Error),

    /// The command ran and exited unsuccessfully.
    #[error("exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// The configured execution user could not be resolved.
    #[error("unknown user {name}: {reason}")]
    UnknownUser { name: String, reason: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "signal".to_string(),
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExecError>;
