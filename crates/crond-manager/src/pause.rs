use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crond_core::api::EntryId;
use crond_scheduler::Runnable;

use crate::{
    binder::EngineBinder,
    registry::{lock, JobState, SharedRegistry},
};

/// One-shot entry that re-activates a paused job.
///
/// When it fires it only acts if the job is still paused under this very
/// proxy; a job deleted, resumed or re-paused in the meantime is left alone.
/// Either way the proxy removes its own entry.
pub struct PauseProxy {
    job: String,
    label: String,
    registry: SharedRegistry,
    binder: EngineBinder,
    entry: OnceLock<EntryId>,
}

impl PauseProxy {
    pub fn new(
        job: impl Into<String>,
        registry: SharedRegistry,
        binder: EngineBinder,
    ) -> Arc<Self> {
        let job = job.into();
        Arc::new(Self {
            label: format!("{job}#pause"),
            job,
            registry,
            binder,
            entry: OnceLock::new(),
        })
    }

    /// Record the engine entry this proxy was registered under. Must be
    /// called while the registry lock is still held.
    pub fn set_entry(&self, id: EntryId) {
        if self.entry.set(id).is_err() {
            warn!(job = %self.job, entry_id = id, "pause proxy entry already set");
        }
    }

    pub fn entry(&self) -> Option<EntryId> {
        self.entry.get().copied()
    }
}

#[async_trait]
impl Runnable for PauseProxy {
    fn name(&self) -> &str {
        &self.label
    }

    async fn run(&self) {
        let Some(own) = self.entry() else {
            warn!(job = %self.job, "pause proxy fired before registration");
            return;
        };

        {
            let mut registry = lock(&self.registry);
            match registry.get_mut(&self.job) {
                Some(record)
                    if matches!(record.state, JobState::Paused { proxy, .. } if proxy == own) =>
                {
                    let entry = self.binder.bind(record);
                    info!(job = %self.job, entry_id = entry, "pause elapsed, job resumed");
                }
                _ => debug!(job = %self.job, entry_id = own, "stale pause proxy ignored"),
            }
        }

        self.binder.engine().remove(own);
    }
}
