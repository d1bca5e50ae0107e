//! Output directory preparation.
//!
//! A build run never writes into a previous run's tree. An existing output
//! directory is renamed out of the way (`<dir>_backup`, else
//! `<dir>_<YYYYMMDD_HHMMSS>`, else `<dir>_<YYYYMMDD_HHMMSS>_<n>`); if the
//! rename fails it is deleted; if that fails too the run stops. A fresh
//! empty directory is then created.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("output path {} has no usable directory name", .0.display())]
    Unnamed(PathBuf),

    #[error(
        "could not rename or remove existing {}; please remove or rename it and run again: {source}",
        path.display()
    )]
    Blocked {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output directory {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What happened to a previous output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Preparation {
    /// Nothing was there.
    Fresh,
    /// The old tree was moved to `backup`.
    BackedUp { backup: PathBuf },
    /// The rename failed and the old tree was deleted.
    Removed,
}

/// The filesystem operations preparation needs.
#[cfg_attr(test, mockall::automock)]
pub trait DirOps: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_all(&self, path: &Path) -> io::Result<()>;
    fn create_all(&self, path: &Path) -> io::Result<()>;
}

/// [`DirOps`] on the real filesystem.
pub struct StdDirOps;

impl DirOps for StdDirOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn create_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

pub struct WorkspaceManager<O = StdDirOps> {
    output_dir: PathBuf,
    ops: O,
}

impl WorkspaceManager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_ops(output_dir, StdDirOps)
    }
}

impl<O: DirOps> WorkspaceManager<O> {
    pub fn with_ops(output_dir: impl Into<PathBuf>, ops: O) -> Self {
        Self {
            output_dir: output_dir.into(),
            ops,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Make room for a new build at the current local time.
    pub fn prepare(&self) -> Result<Preparation, WorkspaceError> {
        self.prepare_at(Local::now())
    }

    pub fn prepare_at(&self, now: DateTime<Local>) -> Result<Preparation, WorkspaceError> {
        let dir = &self.output_dir;
        let preparation = if self.ops.exists(dir) {
            let backup = self.backup_name(now)?;
            match self.ops.rename(dir, &backup) {
                Ok(()) => {
                    info!(from = %dir.display(), to = %backup.display(), "existing output directory backed up");
                    Preparation::BackedUp { backup }
                }
                Err(rename_err) => {
                    warn!(path = %dir.display(), error = %rename_err, "could not rename existing output directory, removing it");
                    self.ops
                        .remove_all(dir)
                        .map_err(|source| WorkspaceError::Blocked {
                            path: dir.clone(),
                            source,
                        })?;
                    info!(path = %dir.display(), "existing output directory removed");
                    Preparation::Removed
                }
            }
        } else {
            Preparation::Fresh
        };

        self.ops
            .create_all(dir)
            .map_err(|source| WorkspaceError::Create {
                path: dir.clone(),
                source,
            })?;
        Ok(preparation)
    }

    /// First free name of `<dir>_backup`, `<dir>_<ts>`, `<dir>_<ts>_<n>`.
    pub fn backup_name(&self, now: DateTime<Local>) -> Result<PathBuf, WorkspaceError> {
        let name = self
            .output_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WorkspaceError::Unnamed(self.output_dir.clone()))?;
        let sibling = |suffix: String| self.output_dir.with_file_name(format!("{name}_{suffix}"));

        let backup = sibling("backup".to_string());
        if !self.ops.exists(&backup) {
            return Ok(backup);
        }
        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        let stamped = sibling(stamp.clone());
        if !self.ops.exists(&stamped) {
            return Ok(stamped);
        }
        let mut n = 1u32;
        loop {
            let candidate = sibling(format!("{stamp}_{n}"));
            if !self.ops.exists(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Edit-mode precondition: the output directory exists and is a directory.
    pub fn require_existing(&self) -> bool {
        self.ops.is_dir(&self.output_dir)
    }
}
