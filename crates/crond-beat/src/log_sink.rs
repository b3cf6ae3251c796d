use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    error::SinkError,
    sink::Sink,
    types::{Event, Metric},
};

/// Sink that only writes to the daemon log. Used when no monitoring
/// endpoint is configured.
pub struct LogSink;

#[async_trait]
impl Sink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_event(&self, event: &Event) -> Result<(), SinkError> {
        warn!(
            event = %event.name,
            dimension = ?event.dimension,
            content = %event.content,
            "event"
        );
        Ok(())
    }

    async fn send_metric(&self, metric: &Metric) -> Result<(), SinkError> {
        info!(metric = %metric.name, value = metric.value, dimension = ?metric.dimension, "metric");
        Ok(())
    }
}
