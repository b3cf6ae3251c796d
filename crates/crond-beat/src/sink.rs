use async_trait::async_trait;

use crate::{
    error::SinkError,
    types::{Event, Metric},
};

/// Common interface of every monitoring sink.
///
/// Implementations must be `Send + Sync`: one sink is shared by all job
/// runners, which fire on independent Tokio tasks.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stable lowercase identifier (e.g. `"http"`).
    fn name(&self) -> &str;

    async fn send_event(&self, event: &Event) -> Result<(), SinkError>;

    async fn send_metric(&self, metric: &Metric) -> Result<(), SinkError>;
}
