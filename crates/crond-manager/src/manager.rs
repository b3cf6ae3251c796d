use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use regex::Regex;
use tracing::{info, instrument, warn};

use crond_core::api::{EntryId, EntryView, JobStatus, StatusFilter};
use crond_core::config::{HEARTBEAT_SCHEDULE, SWEEP_SCHEDULE};
use crond_core::JobDefine;
use crond_scheduler::{Engine, Schedule, Sweeper};

use crate::{
    binder::{EngineBinder, Launcher},
    error::{JobError, Result},
    heartbeat::Heartbeat,
    pause::PauseProxy,
    registry::{lock, JobRecord, JobState, Registry, SharedRegistry},
    store::{ConfigStore, JobsDocument},
};

/// Selection applied to the entries listing.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Exact job name.
    pub name: Option<String>,
    /// Regular expression the job name must match.
    pub name_match: Option<Regex>,
    pub status: StatusFilter,
}

impl EntryFilter {
    fn accepts(&self, record: &JobRecord) -> bool {
        let status_ok = match self.status {
            StatusFilter::Enabled => record.state.is_active(),
            StatusFilter::Disabled => !record.state.is_active(),
            StatusFilter::All => true,
        };
        status_ok
            && self.name.as_deref().is_none_or(|n| n == record.define.name)
            && self
                .name_match
                .as_ref()
                .is_none_or(|re| re.is_match(&record.define.name))
    }
}

/// The job table, the engine it drives and the document it is mirrored to.
///
/// Methods take `&mut self`; the caller is expected to hold one lock around
/// each call so mutations are totally ordered.
pub struct JobManager {
    engine: Arc<Engine>,
    registry: SharedRegistry,
    store: ConfigStore,
    binder: EngineBinder,
    heartbeat: bool,
}

impl JobManager {
    pub fn new(
        engine: Arc<Engine>,
        store: ConfigStore,
        launcher: Launcher,
        heartbeat: bool,
    ) -> Self {
        let binder = EngineBinder::new(Arc::clone(&engine), Arc::new(launcher));
        Self {
            engine,
            registry: Registry::shared(),
            store,
            binder,
            heartbeat,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn config_path(&self) -> &Path {
        self.store.path()
    }

    pub fn document(&self) -> &JobsDocument {
        self.store.document()
    }

    /// Register every job in the loaded document, then the system entries,
    /// then start the clock. Stops at the first job that fails.
    #[instrument(skip(self))]
    pub fn bootstrap(&mut self) -> Result<()> {
        let jobs = self.store.document().jobs.clone();
        for define in jobs {
            self.add(define, false)?;
        }

        self.engine
            .add_expr(SWEEP_SCHEDULE, Sweeper::new(&self.engine))?;
        if self.heartbeat {
            self.engine.add_expr(
                HEARTBEAT_SCHEDULE,
                Heartbeat::new(self.binder.launcher().sink()),
            )?;
        }
        self.engine.start();

        let registry = lock(&self.registry);
        info!(
            jobs = registry.len(),
            active = registry.iter().filter(|r| r.state.is_active()).count(),
            "job table loaded"
        );
        Ok(())
    }

    /// Add a new job. Fails if any job with that name exists in any state.
    /// Returns the new entry ID, or 0 when the job is added disabled.
    #[instrument(skip(self, define), fields(job = %define.name))]
    pub fn add(&mut self, define: JobDefine, permanent: bool) -> Result<EntryId> {
        define.validate()?;
        let schedule = Schedule::parse_recurring(&define.schedule)?;

        let mut registry = lock(&self.registry);
        if registry.contains(&define.name) {
            return Err(JobError::Duplicate { name: define.name });
        }
        if permanent {
            self.store.upsert(&define)?;
        }

        let mut record = JobRecord::new(define, schedule);
        let entry = self.binder.settle(&mut record);
        registry.insert(record)?;
        info!(entry_id = entry, permanent, "job added");
        Ok(entry)
    }

    /// Remove a job in any state. Returns the entry it held, or 0.
    #[instrument(skip(self))]
    pub fn delete(&mut self, name: &str, permanent: bool) -> Result<EntryId> {
        let mut registry = lock(&self.registry);
        if !registry.contains(name) {
            return Err(JobError::not_found(name, "active or disabled jobs"));
        }
        if permanent {
            self.store.remove(name)?;
        }

        let Some(mut record) = registry.remove(name) else {
            return Err(JobError::not_found(name, "active or disabled jobs"));
        };
        let entry = record.state.entry_id();
        self.binder.unbind(&mut record);
        info!(entry_id = entry, permanent, "job deleted");
        Ok(entry)
    }

    /// Take an active job off the schedule but keep its definition.
    #[instrument(skip(self))]
    pub fn disable(&mut self, name: &str, permanent: bool) -> Result<EntryId> {
        let mut registry = lock(&self.registry);
        let record = registry.active_mut(name)?;
        if permanent {
            self.store.upsert(&record.define.with_enable(false))?;
        }

        let entry = record.state.entry_id();
        self.binder.unbind(record);
        info!(entry_id = entry, permanent, "job disabled");
        Ok(entry)
    }

    /// Put a disabled or paused job back on the schedule. A pending pause
    /// proxy is cancelled.
    #[instrument(skip(self))]
    pub fn resume(&mut self, name: &str, permanent: bool) -> Result<EntryId> {
        let mut registry = lock(&self.registry);
        let record = registry.inactive_mut(name)?;
        if permanent {
            self.store.upsert(&record.define.with_enable(true))?;
        }

        self.binder.unbind(record);
        let entry = self.binder.bind(record);
        info!(entry_id = entry, permanent, "job resumed");
        Ok(entry)
    }

    /// Suspend an active job for `duration`, after which it resumes on its
    /// own. Pauses live in memory only. Returns the proxy entry ID.
    #[instrument(skip(self))]
    pub fn pause(&mut self, name: &str, duration: Duration) -> Result<EntryId> {
        let until = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| Local::now().checked_add_signed(d))
            .ok_or_else(|| {
                JobError::InvalidArgument(format!("pause duration {duration:?} out of range"))
            })?;

        let mut registry = lock(&self.registry);
        let record = registry.active_mut(name)?;

        let proxy = PauseProxy::new(name, Arc::clone(&self.registry), self.binder.clone());
        self.binder.unbind(record);
        let proxy_id = self.engine.add(Schedule::once(until), proxy.clone());
        proxy.set_entry(proxy_id);
        record.state = JobState::Paused {
            proxy: proxy_id,
            until,
        };
        info!(entry_id = proxy_id, %until, "job paused");
        Ok(proxy_id)
    }

    /// Give an active job a new schedule, keeping everything else.
    #[instrument(skip(self))]
    pub fn schedule_change(
        &mut self,
        name: &str,
        schedule: &str,
        permanent: bool,
    ) -> Result<EntryId> {
        let parsed = Schedule::parse_recurring(schedule)?;

        let mut registry = lock(&self.registry);
        let record = registry.active_mut(name)?;
        let define = JobDefine {
            schedule: schedule.to_string(),
            ..record.define.clone()
        };
        if permanent {
            self.store.upsert(&define)?;
        }

        let entry = replace(&self.binder, record, define, parsed);
        info!(entry_id = entry, permanent, "job schedule changed");
        Ok(entry)
    }

    /// Make the job table hold exactly `define`, adding or replacing as
    /// needed. Repeating the same request changes nothing.
    #[instrument(skip(self, define), fields(job = %define.name))]
    pub fn create_or_replace(&mut self, define: JobDefine, permanent: bool) -> Result<EntryId> {
        define.validate()?;
        let schedule = Schedule::parse_recurring(&define.schedule)?;

        let mut registry = lock(&self.registry);
        let Some(record) = registry.get_mut(&define.name) else {
            if permanent {
                self.store.upsert(&define)?;
            }
            let mut record = JobRecord::new(define, schedule);
            let entry = self.binder.settle(&mut record);
            registry.insert(record)?;
            info!(entry_id = entry, permanent, "job created");
            return Ok(entry);
        };

        if permanent && self.store.document().find(&define.name) != Some(&define) {
            self.store.upsert(&define)?;
        }

        let settled = matches!(
            (define.enabled(), record.state),
            (true, JobState::Active { .. }) | (false, JobState::Disabled)
        );
        if settled && record.define == define {
            return Ok(record.state.entry_id());
        }

        let entry = replace(&self.binder, record, define, schedule);
        info!(entry_id = entry, permanent, "job replaced");
        Ok(entry)
    }

    /// Re-read the jobs document and rebuild the whole table from it.
    ///
    /// The new document is validated in full before anything is torn down;
    /// a bad document leaves the running table untouched.
    #[instrument(skip(self))]
    pub fn reload(&mut self) -> Result<()> {
        let doc = self.store.read_disk()?;
        validate_document(&doc)?;

        self.engine.stop();
        self.engine.clear();
        lock(&self.registry).clear();
        self.store.replace(doc);
        info!(path = %self.store.path().display(), "jobs config reloaded");
        self.bootstrap()
    }

    /// Current table, filtered, ordered by name.
    pub fn entries(&self, filter: &EntryFilter) -> Vec<EntryView> {
        let registry = lock(&self.registry);
        registry
            .iter()
            .filter(|r| filter.accepts(r))
            .map(|r| {
                let id = r.state.entry_id();
                // a paused job reports its proxy, whose next firing is the resume time
                let snapshot = match r.state {
                    JobState::Active { entry } | JobState::Paused { proxy: entry, .. } => {
                        self.engine.entry(entry)
                    }
                    JobState::Disabled => None,
                };
                EntryView {
                    id,
                    status: r.state.status(),
                    job: r.define.clone(),
                    next: snapshot.as_ref().and_then(|s| s.next),
                    prev: snapshot.and_then(|s| s.prev),
                }
            })
            .collect()
    }

    /// Definitions of every disabled or paused job.
    pub fn disabled(&self) -> Vec<JobDefine> {
        lock(&self.registry)
            .iter()
            .filter(|r| !r.state.is_active())
            .map(|r| r.define.clone())
            .collect()
    }

    /// State of one job, if known.
    pub fn status(&self, name: &str) -> Option<JobStatus> {
        lock(&self.registry).get(name).map(|r| r.state.status())
    }
}

/// Swap the definition of an existing record, reusing its run guard so the
/// old and new runners never overlap.
fn replace(
    binder: &EngineBinder,
    record: &mut JobRecord,
    define: JobDefine,
    schedule: Schedule,
) -> EntryId {
    binder.unbind(record);
    record.define = define;
    record.schedule = schedule;
    binder.settle(record)
}

fn validate_document(doc: &JobsDocument) -> Result<()> {
    let mut seen = HashSet::new();
    for define in &doc.jobs {
        define.validate()?;
        Schedule::parse_recurring(&define.schedule)?;
        if !seen.insert(define.name.as_str()) {
            warn!(job = %define.name, "duplicate job in jobs config");
            return Err(JobError::Duplicate {
                name: define.name.clone(),
            });
        }
    }
    Ok(())
}
