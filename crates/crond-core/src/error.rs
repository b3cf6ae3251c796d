use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid job definition: {0}")]
    InvalidJob(String),
}

impl CoreError {
    /// Short error code string returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::InvalidJob(_) => "INVALID_JOB",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
