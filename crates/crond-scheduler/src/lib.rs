//! `crond-scheduler`: calendar scheduler engine for the crond daemon.
//!
//! # Overview
//!
//! An [`Engine`] holds a table of entries, each pairing a [`Schedule`] with a
//! [`Runnable`]. A clock task sleeps until the earliest next-fire time and
//! spawns every due runnable as its own Tokio task, so a slow firing never
//! delays the others and a job can overlap with its own previous run.
//!
//! # Schedule grammar
//!
//! | Expression              | Behaviour                                     |
//! |-------------------------|-----------------------------------------------|
//! | `*/5 * * * *`           | 5-field cron, seconds fixed at 0              |
//! | `*/5 * * * * *`         | 6-field cron with leading seconds (7: year)   |
//! | `@daily`, `@hourly`, …  | Descriptors                                   |
//! | `@every 1h30m`          | Fixed interval, minimum one second            |
//! | `@at 2026-01-02T03:04:05+08:00` | One-shot at an absolute instant       |
//!
//! Day-of-week numbers follow crontab: 0 and 7 are Sunday, 1 is Monday.
//! Expressions that can never fire again (a past `@at`, a cron year
//! already gone) are rejected at parse time.
//!
//! One-shot entries are never fired twice, but stay in the table until
//! removed; [`Sweeper`] is the runnable that clears exhausted entries.

pub mod engine;
pub mod error;
pub mod schedule;
pub mod sweep;

pub use engine::{Engine, EntryId, EntrySnapshot, Runnable};
pub use error::{Result, SchedulerError};
pub use schedule::Schedule;
pub use sweep::Sweeper;
