use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crond_beat::{Metric, Sink, METRIC_HEARTBEAT};
use crond_scheduler::Runnable;

/// System entry reporting that the scheduler loop is alive.
pub struct Heartbeat {
    sink: Arc<dyn Sink>,
}

impl Heartbeat {
    pub fn new(sink: Arc<dyn Sink>) -> Arc<Self> {
        Arc::new(Self { sink })
    }
}

#[async_trait]
impl Runnable for Heartbeat {
    fn name(&self) -> &str {
        "crond-heartbeat"
    }

    async fn run(&self) {
        match self.sink.send_metric(&Metric::new(METRIC_HEARTBEAT, 1)).await {
            Ok(()) => debug!("heartbeat sent"),
            Err(e) => warn!(error = %e, "heartbeat delivery failed"),
        }
    }
}
