//! Mount-namespace resolution
//!
//! A target running in a container sees a different filesystem than we do.
//! The paths in its `/proc/<pid>/maps` are relative to its own root, so to
//! open the interpreter image we go through `/proc/<pid>/root`.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::domain::{AttachmentError, Pid};

/// How to turn a path seen by the target into one we can open
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceContext {
    root: Option<PathBuf>,
}

impl NamespaceContext {
    /// Target shares our mount namespace
    #[must_use]
    pub fn host() -> Self {
        Self { root: None }
    }

    /// Target's `/` is reachable at `root`
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    /// Compare our mount namespace with the target's
    ///
    /// # Errors
    /// [`AttachmentError::Namespace`] if either namespace link is unreadable.
    pub fn resolve(pid: Pid) -> Result<Self, AttachmentError> {
        let ours = read_mnt_ns(Path::new("/proc/self/ns/mnt"), pid)?;
        let theirs = read_mnt_ns(Path::new(&format!("/proc/{pid}/ns/mnt")), pid)?;

        if ours == theirs {
            Ok(Self::host())
        } else {
            debug!(
                "Process {pid} is in mount namespace {} (ours: {})",
                theirs.display(),
                ours.display()
            );
            Ok(Self::rooted_at(format!("/proc/{pid}/root")))
        }
    }

    #[must_use]
    pub fn is_foreign(&self) -> bool {
        self.root.is_some()
    }

    /// Translate a target-side absolute path
    #[must_use]
    pub fn host_path(&self, path: &Path) -> PathBuf {
        match &self.root {
            None => path.to_path_buf(),
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
        }
    }
}

fn read_mnt_ns(link: &Path, pid: Pid) -> Result<PathBuf, AttachmentError> {
    fs::read_link(link).map_err(|e| AttachmentError::Namespace {
        pid,
        reason: format!("cannot read {}: {e}", link.display()),
    })
}
