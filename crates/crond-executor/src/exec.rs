//! One execution of a job command.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crond_core::JobDefine;

use crate::{
    credential::ExecUser,
    error::{ExecError, Result},
    output,
};

/// Everything needed to launch a job's command.
#[derive(Debug, Clone)]
pub struct ExecSpec {
    pub command: String,
    pub args: Vec<String>,
    pub work_dir: Option<PathBuf>,
    pub user: Option<ExecUser>,
}

impl ExecSpec {
    /// Snapshot the execution fields of `define`. Later edits to the job
    /// table do not affect an already-built spec.
    pub fn from_define(define: &JobDefine, user: Option<ExecUser>) -> Self {
        Self {
            command: define.command.clone(),
            args: define.args.clone(),
            work_dir: define
                .work_dir
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
            user,
        }
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run the command to completion.
///
/// # Errors
///
/// - `Spawn`: the process could not be started.
/// - `NonZeroExit`: it exited non-zero or was killed by a signal; carries
///   the cleaned stderr.
pub async fn execute(spec: &ExecSpec) -> Result<ExecOutput> {
    let mut cmd = Command::new(&spec.command);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.work_dir {
        cmd.current_dir(dir);
    }
    if let Some(user) = &spec.user {
        cmd.uid(user.uid)
            .gid(user.gid)
            .env("USER", &user.name)
            .env("LOGNAME", &user.name)
            .env("HOME", &user.home);
    }

    debug!(command = %spec.command, args = ?spec.args, "exec");
    let out = cmd.output().await.map_err(ExecError::Spawn)?;

    let stdout = output::clean(&out.stdout);
    let stderr = output::clean(&out.stderr);
    if !out.status.success() {
        return Err(ExecError::NonZeroExit {
            code: out.status.code(),
            stderr,
        });
    }
    Ok(ExecOutput { stdout, stderr })
}
