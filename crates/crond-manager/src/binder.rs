use std::sync::Arc;

use tracing::debug;

use crond_beat::Sink;
use crond_core::api::EntryId;
use crond_core::JobDefine;
use crond_executor::{ExecSpec, ExecUser, JobRunner, RunGuard};
use crond_scheduler::Engine;

use crate::registry::{JobRecord, JobState};

/// Builds the runner registered for a job.
pub struct Launcher {
    sink: Arc<dyn Sink>,
    user: Option<ExecUser>,
}

impl Launcher {
    pub fn new(sink: Arc<dyn Sink>, user: Option<ExecUser>) -> Self {
        Self { sink, user }
    }

    pub fn sink(&self) -> Arc<dyn Sink> {
        Arc::clone(&self.sink)
    }

    pub fn runner(&self, define: &JobDefine, guard: Arc<RunGuard>) -> Arc<JobRunner> {
        let spec = ExecSpec::from_define(define, self.user.clone());
        Arc::new(JobRunner::new(
            define.name.as_str(),
            spec,
            guard,
            Arc::clone(&self.sink),
        ))
    }
}

/// Moves job records in and out of the engine. Shared by the manager and
/// the pause proxies it creates.
#[derive(Clone)]
pub struct EngineBinder {
    engine: Arc<Engine>,
    launcher: Arc<Launcher>,
}

impl EngineBinder {
    pub fn new(engine: Arc<Engine>, launcher: Arc<Launcher>) -> Self {
        Self { engine, launcher }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn launcher(&self) -> &Arc<Launcher> {
        &self.launcher
    }

    /// Register `record` with the engine and mark it active.
    pub fn bind(&self, record: &mut JobRecord) -> EntryId {
        let runner = self
            .launcher
            .runner(&record.define, Arc::clone(&record.guard));
        let entry = self.engine.add(record.schedule.clone(), runner);
        record.state = JobState::Active { entry };
        record.define.enable = Some(true);
        entry
    }

    /// Remove whatever engine entry `record` holds and mark it disabled.
    pub fn unbind(&self, record: &mut JobRecord) {
        match record.state {
            JobState::Active { entry } | JobState::Paused { proxy: entry, .. } => {
                self.engine.remove(entry);
                debug!(job = %record.define.name, entry_id = entry, "job unbound");
            }
            JobState::Disabled => {}
        }
        record.state = JobState::Disabled;
        record.define.enable = Some(false);
    }

    /// Bind when the definition asks for it, otherwise leave disabled.
    /// Returns the new entry ID, or 0.
    pub fn settle(&self, record: &mut JobRecord) -> EntryId {
        if record.define.enabled() {
            self.bind(record)
        } else {
            record.state = JobState::Disabled;
            0
        }
    }
}
