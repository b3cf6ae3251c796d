//! `crond-core`: types and configuration shared by the crond daemon, its
//! job manager and the `crondctl` client.

pub mod api;
pub mod config;
pub mod error;
pub mod types;

pub use config::CrondConfig;
pub use error::{CoreError, Result};
pub use types::JobDefine;
