//! Parser for yt-dlp output

use crate::error::FetchError;
use crate::types::VideoInfo;
use regex::Regex;
use std::path::PathBuf;
use std::str;
use std::sync::LazyLock;

/// What a finished constrained fetch amounted to
///
/// The tool does not reliably report where it wrote the file, so a successful
/// exit is not enough: the artifact still has to be found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Exit zero and the artifact was located
    Resolved(PathBuf),
    /// Exit non-zero; carries the tool's diagnostic
    Failed(String),
    /// Exit zero but neither the naming convention nor the output led to a file
    Unresolved,
}

// Literal patterns, exercised by the tests below.
#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid yt-dlp output pattern")
}

static MERGER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"^\[Merger\] Merging formats into "(?P<path>.+)"\s*$"#));
static MOVE_FILES: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"^\[MoveFiles\] Moving file ".+" to "(?P<path>.+)"\s*$"#));
static DESTINATION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Destination: (?P<path>.+?)\s*$"));
static ALREADY_DOWNLOADED: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\[download\] (?P<path>.+) has already been downloaded"));

/// Pick the text shown to the user for a failed invocation
///
/// The trimmed error stream when it has content, otherwise `fallback`
/// (typically the exit status description).
pub fn diagnostic(stderr: &[u8], fallback: &str) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse the single JSON record printed by `yt-dlp --dump-json`
///
/// Leading blank lines or stray non-JSON lines are skipped; the first line that
/// starts with `{` is the record.
pub fn parse_video_info(stdout: &[u8]) -> Result<VideoInfo, FetchError> {
    let output = str::from_utf8(stdout)
        .map_err(|e| FetchError::MalformedMetadata(format!("output is not UTF-8: {}", e)))?;

    let record = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
        .ok_or_else(|| FetchError::MalformedMetadata("no metadata record in output".to_string()))?;

    serde_json::from_str(record).map_err(|e| FetchError::MalformedMetadata(e.to_string()))
}

/// Collect every output path yt-dlp mentions, in the order reported
///
/// Recognized lines:
/// - `[Merger] Merging formats into "<path>"`
/// - `[MoveFiles] Moving file "<from>" to "<path>"`
/// - `... Destination: <path>` (download, conversion and extraction steps)
/// - `[download] <path> has already been downloaded`
pub fn reported_destinations(stdout: &[u8]) -> Vec<PathBuf> {
    let output = String::from_utf8_lossy(stdout);
    let mut paths: Vec<PathBuf> = Vec::new();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        let captured = MERGER
            .captures(line)
            .or_else(|| MOVE_FILES.captures(line))
            .or_else(|| DESTINATION.captures(line))
            .or_else(|| ALREADY_DOWNLOADED.captures(line));

        if let Some(caps) = captured
            && let Some(path) = caps.name("path")
        {
            let path = PathBuf::from(path.as_str().trim());
            if !path.as_os_str().is_empty() {
                paths.push(path);
            }
        }
    }

    paths
}
