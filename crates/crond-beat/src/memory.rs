use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    error::SinkError,
    sink::Sink,
    types::{Event, Metric},
};

/// Sink that keeps everything in memory. Lets callers assert on what a
/// runner reported.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
    metrics: Mutex<Vec<Metric>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn metrics(&self) -> Vec<Metric> {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send_event(&self, event: &Event) -> Result<(), SinkError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }

    async fn send_metric(&self, metric: &Metric) -> Result<(), SinkError> {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(metric.clone());
        Ok(())
    }
}
