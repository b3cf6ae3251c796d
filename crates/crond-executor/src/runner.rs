use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crond_beat::{Event, Sink, EVENT_JOB_FAILED, EVENT_JOB_SKIPPED};
use crond_scheduler::Runnable;

use crate::{
    exec::{execute, ExecSpec},
    guard::RunGuard,
    output::{clip_tail, DEFAULT_MAX_CHARS},
};

/// Runtime wrapper around one job: the entry the scheduler fires.
pub struct JobRunner {
    name: String,
    spec: ExecSpec,
    guard: Arc<RunGuard>,
    sink: Arc<dyn Sink>,
}

impl JobRunner {
    /// `guard` is shared with every other runner built for the same job, so
    /// replacing a job's schedule does not let the old and new entries
    /// overlap.
    pub fn new(
        name: impl Into<String>,
        spec: ExecSpec,
        guard: Arc<RunGuard>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            name: name.into(),
            spec,
            guard,
            sink,
        }
    }

    async fn report(&self, event: Event) {
        if let Err(e) = self.sink.send_event(&event).await {
            warn!(job = %self.name, error = %e, event = %event.name, "event delivery failed");
        }
    }
}

#[async_trait]
impl Runnable for JobRunner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) {
        let Some(_permit) = self.guard.try_acquire() else {
            warn!(job = %self.name, "skipped: previous run still in progress");
            self.report(
                Event::new(
                    EVENT_JOB_SKIPPED,
                    format!("{}: skipped, previous run still in progress", self.name),
                )
                .with_dimension("job", self.name.as_str()),
            )
            .await;
            return;
        };

        let started = Instant::now();
        match execute(&self.spec).await {
            Ok(out) => {
                info!(
                    job = %self.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    stdout = %clip_tail(&out.stdout, DEFAULT_MAX_CHARS),
                    "job finished"
                );
            }
            Err(e) => {
                let detail = clip_tail(&e.to_string(), DEFAULT_MAX_CHARS);
                error!(job = %self.name, error = %detail, "job failed");
                self.report(
                    Event::new(EVENT_JOB_FAILED, format!("{}: {detail}", self.name))
                        .with_dimension("job", self.name.as_str())
                        .with_dimension("command", self.spec.command.as_str()),
                )
                .await;
            }
        }
    }
}
