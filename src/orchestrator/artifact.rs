//! RAII ownership of a downloaded artifact

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Deletes the artifact, and every other file carrying the request's prefix,
/// when dropped
///
/// Held from the moment a download is verified until the request ends, so the
/// files are removed on every exit path, including panics and cancellation of
/// the request task. [`ArtifactGuard::remove`] does the same asynchronously on
/// the normal path. Side files such as separate audio streams or the original
/// before recoding share the prefix and go with the artifact.
#[must_use = "the artifact is deleted as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ArtifactGuard {
    path: PathBuf,
    dir: PathBuf,
    prefix: String,
    armed: bool,
}

impl ArtifactGuard {
    /// Take ownership of the file at `path` and of everything named
    /// `<prefix>…` in `dir`
    pub fn new(path: PathBuf, dir: PathBuf, prefix: String) -> Self {
        Self {
            path,
            dir,
            prefix,
            armed: true,
        }
    }

    /// Path of the owned file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the artifact and its side files now; returns whether the
    /// artifact itself was removed
    pub async fn remove(mut self) -> bool {
        self.armed = false;
        let removed = delete_logged(&self.path, tokio::fs::remove_file(&self.path).await);
        let extra = crate::media::remove_prefixed(&self.dir, &self.prefix).await;
        if extra > 0 {
            debug!(prefix = %self.prefix, extra, "removed side files");
        }
        removed
    }

    fn sweep_blocking(&self) {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = ?self.dir,
                    error = %e,
                    "failed to scan download directory for cleanup"
                );
                return;
            }
        };
        for entry in entries.flatten() {
            let is_ours = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(&self.prefix));
            if is_ours && entry.file_type().is_ok_and(|ft| ft.is_file()) {
                let path = entry.path();
                delete_logged(&path, std::fs::remove_file(&path));
            }
        }
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.armed {
            delete_logged(&self.path, std::fs::remove_file(&self.path));
            self.sweep_blocking();
        }
    }
}

fn delete_logged(path: &Path, result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            debug!(?path, "artifact deleted");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(?path, error = %e, "failed to delete artifact");
            false
        }
    }
}
