//! The persisted jobs document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crond_core::JobDefine;

use crate::error::{JobError, Result};

/// On-disk shape of the jobs config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsDocument {
    #[serde(default)]
    pub bk_biz_id: i64,
    #[serde(default)]
    pub jobs: Vec<JobDefine>,
}

impl JobsDocument {
    pub fn find(&self, name: &str) -> Option<&JobDefine> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Replace the job with the same name, or append.
    pub fn upsert(&mut self, define: JobDefine) {
        match self.jobs.iter_mut().find(|j| j.name == define.name) {
            Some(slot) => *slot = define,
            None => self.jobs.push(define),
        }
    }

    /// Drop every job named `name`. Returns false if there was none.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.name != name);
        self.jobs.len() != before
    }
}

/// Jobs document plus the file it is mirrored to.
///
/// Changes are applied to a copy, written to a temp file in the same
/// directory and renamed over the target. The in-memory document only moves
/// forward once the rename succeeded.
pub struct ConfigStore {
    path: PathBuf,
    doc: JobsDocument,
}

impl ConfigStore {
    /// Load `path`. A missing file is an empty document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = match read(&path) {
            Ok(doc) => doc,
            Err(JobError::Persistence { .. }) if !path.exists() => {
                warn!(path = %path.display(), "jobs config not found, starting empty");
                JobsDocument::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &JobsDocument {
        &self.doc
    }

    /// Fresh copy of the file as it is on disk now.
    pub fn read_disk(&self) -> Result<JobsDocument> {
        read(&self.path)
    }

    /// Swap in a document already known to match the file.
    pub fn replace(&mut self, doc: JobsDocument) {
        self.doc = doc;
    }

    pub fn upsert(&mut self, define: &JobDefine) -> Result<()> {
        self.apply(|doc| doc.upsert(define.clone()))
    }

    /// Remove `name`. Absent names are not an error.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.apply(|doc| {
            doc.remove(name);
        })
    }

    fn apply(&mut self, change: impl FnOnce(&mut JobsDocument)) -> Result<()> {
        let mut next = self.doc.clone();
        change(&mut next);
        write_atomic(&self.path, &next)?;
        self.doc = next;
        Ok(())
    }
}

fn read(path: &Path) -> Result<JobsDocument> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => JobError::persistence(path, "file not found"),
        _ => JobError::persistence(path, e),
    })?;
    toml::from_str(&text).map_err(|e| JobError::persistence(path, e))
}

fn write_atomic(path: &Path, doc: &JobsDocument) -> Result<()> {
    let text = toml::to_string_pretty(doc).map_err(|e| JobError::persistence(path, e))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| JobError::persistence(path, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| JobError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| JobError::persistence(path, e.error))?;

    debug!(path = %path.display(), jobs = doc.jobs.len(), "jobs config written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn define(name: &str, enable: bool) -> JobDefine {
        JobDefine {
            name: name.into(),
            command: "/usr/local/bin/backup.sh".into(),
            args: vec!["--full".into()],
            schedule: "0 2 * * *".into(),
            creator: "dba".into(),
            enable: Some(enable),
            work_dir: None,
        }
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("jobs.toml")).unwrap();
        assert!(store.document().jobs.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.toml");
        fs::write(&path, "jobs = 3").unwrap();
        let err = ConfigStore::open(&path).err().unwrap();
        assert_eq!(err.code(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn upsert_replaces_by_name_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.toml");
        let mut store = ConfigStore::open(&path).unwrap();
        store.upsert(&define("backup", true)).unwrap();
        store.upsert(&define("rotate", true)).unwrap();
        store.upsert(&define("backup", false)).unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.document(), store.document());
        assert_eq!(reopened.document().jobs.len(), 2);
        assert_eq!(reopened.document().find("backup").unwrap().enable, Some(false));
    }

    #[test]
    fn removing_absent_name_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path().join("jobs.toml")).unwrap();
        store.upsert(&define("backup", true)).unwrap();
        store.remove("nope").unwrap();
        store.remove("backup").unwrap();
        assert!(store.document().jobs.is_empty());
    }

    #[test]
    fn failed_write_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("jobs.toml");
        let mut store = ConfigStore::open(&path).unwrap();
        let err = store.upsert(&define("backup", true)).unwrap_err();
        assert_eq!(err.code(), "PERSISTENCE_ERROR");
        assert!(store.document().jobs.is_empty());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path().join("jobs.toml")).unwrap();
        store.upsert(&define("backup", true)).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("jobs.toml")]);
    }
}
