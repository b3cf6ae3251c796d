use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};

use crond_core::api::{EntryId, JobStatus};
use crond_core::JobDefine;
use crond_executor::RunGuard;
use crond_scheduler::Schedule;

use crate::error::{JobError, Result};

/// Where a job currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Registered with the engine under `entry`.
    Active { entry: EntryId },
    /// Known but not scheduled.
    Disabled,
    /// Not scheduled; the one-shot `proxy` entry re-activates it at `until`.
    Paused {
        proxy: EntryId,
        until: DateTime<Local>,
    },
}

impl JobState {
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Active { .. })
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Active { .. } => JobStatus::Enabled,
            JobState::Disabled => JobStatus::Disabled,
            JobState::Paused { .. } => JobStatus::Paused,
        }
    }

    /// Engine entry that belongs to this job, or 0 when it has none.
    pub fn entry_id(&self) -> EntryId {
        match self {
            JobState::Active { entry } => *entry,
            JobState::Paused { proxy, .. } => *proxy,
            JobState::Disabled => 0,
        }
    }
}

/// One row of the job table.
#[derive(Debug)]
pub struct JobRecord {
    pub define: JobDefine,
    pub schedule: Schedule,
    pub state: JobState,
    /// Shared by every runner built for this job, across reschedules.
    pub guard: Arc<RunGuard>,
}

impl JobRecord {
    /// New record, not yet bound to the engine.
    pub fn new(define: JobDefine, schedule: Schedule) -> Self {
        Self {
            define,
            schedule,
            state: JobState::Disabled,
            guard: Arc::new(RunGuard::new()),
        }
    }
}

/// Job table keyed by name. Holding one record per name is what keeps a job
/// from being active and disabled at the same time.
#[derive(Default)]
pub struct Registry {
    jobs: BTreeMap<String, JobRecord>,
}

pub type SharedRegistry = Arc<Mutex<Registry>>;

impl Registry {
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&JobRecord> {
        self.jobs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut JobRecord> {
        self.jobs.get_mut(name)
    }

    /// Active record named `name`, or `NotFound`.
    pub fn active_mut(&mut self, name: &str) -> Result<&mut JobRecord> {
        self.jobs
            .get_mut(name)
            .filter(|r| r.state.is_active())
            .ok_or_else(|| JobError::not_found(name, "active jobs"))
    }

    /// Disabled or paused record named `name`, or `NotFound`.
    pub fn inactive_mut(&mut self, name: &str) -> Result<&mut JobRecord> {
        self.jobs
            .get_mut(name)
            .filter(|r| !r.state.is_active())
            .ok_or_else(|| JobError::not_found(name, "disabled jobs"))
    }

    pub fn insert(&mut self, record: JobRecord) -> Result<()> {
        if self.contains(&record.define.name) {
            return Err(JobError::Duplicate {
                name: record.define.name,
            });
        }
        self.jobs.insert(record.define.name.clone(), record);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<JobRecord> {
        self.jobs.remove(name)
    }

    /// Records ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}

pub(crate) fn lock(registry: &SharedRegistry) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> JobRecord {
        let define = JobDefine {
            name: name.into(),
            command: "/bin/true".into(),
            args: vec![],
            schedule: "@hourly".into(),
            creator: String::new(),
            enable: Some(true),
            work_dir: None,
        };
        JobRecord::new(define, Schedule::parse("@hourly").unwrap())
    }

    #[test]
    fn names_are_unique() {
        let mut reg = Registry::default();
        reg.insert(record("a")).unwrap();
        let err = reg.insert(record("a")).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_JOB");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn state_filters() {
        let mut reg = Registry::default();
        reg.insert(record("a")).unwrap();
        assert!(reg.active_mut("a").is_err());
        assert!(reg.inactive_mut("a").is_ok());

        reg.get_mut("a").unwrap().state = JobState::Active { entry: 4 };
        assert_eq!(reg.active_mut("a").unwrap().state.entry_id(), 4);
        assert!(reg.inactive_mut("a").unwrap_err().is_not_found());
        assert!(reg.active_mut("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn paused_reports_proxy_entry() {
        let state = JobState::Paused {
            proxy: 9,
            until: Local::now(),
        };
        assert_eq!(state.entry_id(), 9);
        assert_eq!(state.status(), JobStatus::Paused);
        assert!(!state.is_active());
    }
}
