//! `crond-executor`: what happens when a job fires.
//!
//! [`JobRunner`] is the [`Runnable`](crond_scheduler::Runnable) registered for
//! every active job. Each firing:
//!
//! 1. tries the job's [`RunGuard`] without blocking; a busy guard means the
//!    previous run is still going, so this firing is skipped and reported;
//! 2. runs the command, optionally as another OS user, capturing stdout and
//!    stderr separately;
//! 3. reports non-zero exits and launch failures to the monitoring sink;
//! 4. releases the guard, even if the run panicked.

pub mod credential;
pub mod error;
pub mod exec;
pub mod guard;
pub mod output;
pub mod runner;

pub use credential::ExecUser;
pub use error::{ExecError, Result};
pub use exec::{execute, ExecOutput, ExecSpec};
pub use guard::{RunGuard, RunPermit};
pub use runner::JobRunner;
