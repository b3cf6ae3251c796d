//! `crond-manager`: the job table and every operation that mutates it.
//!
//! # Overview
//!
//! A [`JobManager`] owns three things:
//!
//! - the [`Registry`]: one record per job name, tagged with its state
//!   (active with a scheduler entry, disabled, or paused behind a one-shot
//!   proxy entry), so a name can never be both active and disabled;
//! - a handle on the scheduler [`Engine`](crond_scheduler::Engine) those
//!   entries live in;
//! - the [`ConfigStore`]: the persisted jobs document, rewritten atomically
//!   on every *permanent* mutation.
//!
//! Every mutation validates first, persists second and commits to memory
//! last. The commit step cannot fail, so a persistence error leaves both the
//! table and the document exactly as they were.
//!
//! Callers serialise mutations themselves (the HTTP layer holds one lock for
//! the whole request). The registry carries its own mutex because pause
//! proxies touch it from scheduler tasks.

pub mod binder;
pub mod error;
pub mod heartbeat;
pub mod manager;
pub mod pause;
pub mod registry;
pub mod store;

pub use binder::{EngineBinder, Launcher};
pub use error::{JobError, Result};
pub use manager::{EntryFilter, JobManager};
pub use pause::PauseProxy;
pub use registry::{JobRecord, JobState, Registry, SharedRegistry};
pub use store::{ConfigStore, JobsDocument};
