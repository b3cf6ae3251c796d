//! `crond-beat`: delivery of job events and daemon metrics to the
//! monitoring sink.

pub mod error;
pub mod http;
pub mod log_sink;
pub mod memory;
pub mod sink;
pub mod types;

use std::sync::Arc;

use crond_core::config::BeatConfig;

pub use error::SinkError;
pub use http::HttpSink;
pub use log_sink::LogSink;
pub use memory::MemorySink;
pub use sink::Sink;
pub use types::{Event, Metric};

/// Event sent when a job exits non-zero or fails to launch.
pub const EVENT_JOB_FAILED: &str = "crond_job_failed";
/// Event sent when a firing is skipped because the previous run is still going.
pub const EVENT_JOB_SKIPPED: &str = "crond_job_skipped";
/// Liveness metric of the daemon's own scheduler loop.
pub const METRIC_HEARTBEAT: &str = "crond_heart_beat";

/// Build the sink described by `config`: HTTP when any URL is configured,
/// log-only otherwise.
pub fn build_sink(config: &BeatConfig, bk_biz_id: i64) -> Result<Arc<dyn Sink>, SinkError> {
    if config.event_url.is_none() && config.metrics_url.is_none() {
        return Ok(Arc::new(LogSink));
    }
    Ok(Arc::new(HttpSink::new(config, bk_biz_id)?))
}
