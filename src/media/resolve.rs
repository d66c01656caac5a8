//! Locating and removing artifacts by their per-request prefix

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Suffixes of yt-dlp scratch files that never count as the artifact
const SCRATCH_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

fn is_scratch(name: &str) -> bool {
    SCRATCH_SUFFIXES.iter().any(|s| name.ends_with(s)) || name.contains(".part-Frag")
}

/// Regular files in `dir` whose name starts with `prefix`, sorted by name
async fn prefixed_files(dir: &Path, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        match entry.file_type().await {
            Ok(ft) if ft.is_file() => found.push(entry.path()),
            _ => {}
        }
    }

    found.sort();
    Ok(found)
}

/// Find the artifact produced for `prefix`
///
/// 1. Scan `dir` for a regular file named `<prefix>…`, skipping scratch files.
///    When several match, one with `preferred_ext` wins, otherwise the
///    lexicographically first.
/// 2. Otherwise take the last of `reported` (paths from the tool's output)
///    that exists on disk as a regular file.
///
/// Returns `None` when neither step finds a file.
pub async fn resolve_artifact(
    dir: &Path,
    prefix: &str,
    preferred_ext: &str,
    reported: &[PathBuf],
) -> Option<PathBuf> {
    match prefixed_files(dir, prefix).await {
        Ok(files) => {
            let candidates: Vec<&PathBuf> = files
                .iter()
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| !is_scratch(n))
                })
                .collect();

            let preferred = candidates.iter().find(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(preferred_ext))
            });
            if let Some(path) = preferred.or(candidates.first()) {
                debug!(?path, prefix, "artifact found by prefix");
                return Some((*path).clone());
            }
        }
        Err(e) => {
            warn!(?dir, error = %e, "failed to scan download directory");
        }
    }

    for path in reported.iter().rev() {
        if let Ok(meta) = fs::metadata(path).await
            && meta.is_file()
        {
            debug!(?path, "artifact found from tool output");
            return Some(path.clone());
        }
    }

    None
}

/// Delete every regular file in `dir` starting with `prefix`
///
/// Errors are logged as warnings and do not stop the sweep. Returns the number
/// of files deleted.
pub async fn remove_prefixed(dir: &Path, prefix: &str) -> usize {
    let files = match prefixed_files(dir, prefix).await {
        Ok(files) => files,
        Err(e) => {
            warn!(?dir, error = %e, "failed to scan download directory for cleanup");
            return 0;
        }
    };

    let mut removed = 0;
    for file in files {
        match fs::remove_file(&file).await {
            Ok(()) => {
                debug!(?file, "removed partial artifact");
                removed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(?file, error = %e, "failed to remove partial artifact"),
        }
    }
    removed
}
