use thiserror::Error;

/// Errors raised while delivering to the monitoring sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The request could not be sent (connect, timeout, TLS).
    #[error("Send failed: {0}")]
    SendFailed(#[from] reqwest::Error),

    /// The sink answered with a non-success status.
    #[error("Sink rejected payload ({status}): {message}")]
    Rejected { status: u16, message: String },
}
