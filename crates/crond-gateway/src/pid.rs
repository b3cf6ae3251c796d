use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// PID file of the running daemon.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process ID to `path`, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let pid = std::process::id();
        fs::write(&path, pid.to_string())?;
        info!(path = %path.display(), pid, "PID file created");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file. A file that is already gone is fine.
    pub fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "PID file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "PID file removal failed"),
        }
    }
}
