//! Resolution of the OS identity jobs execute as.

use std::path::PathBuf;

use nix::unistd::{geteuid, User};

use crate::error::{ExecError, Result};

/// Credentials applied to every job child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecUser {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl ExecUser {
    /// Look up `name` in the user database.
    ///
    /// Returns `None` when no user is configured or when the daemon already
    /// runs as that user, in which case no credential switch is needed.
    pub fn resolve(name: Option<&str>) -> Result<Option<Self>> {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return Ok(None);
        };
        let user = User::from_name(name)
            .map_err(|e| ExecError::UnknownUser {
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| ExecError::UnknownUser {
                name: name.to_string(),
                reason: "no such user".to_string(),
            })?;

        if user.uid == geteuid() {
            return Ok(None);
        }
        Ok(Some(Self {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
        }))
    }
}
