//! yt-dlp stand-ins and metadata fixtures

use std::path::Path;
use tempfile::TempDir;
use vidgrab::YtDlpFetcher;

/// `--dump-json` record for a short clip
pub const CLIP_JSON: &str = r#"{"id": "abc123", "title": "Sunset timelapse", "duration": 95.0, "webpage_url": "https://example.com/watch?v=abc123", "extractor": "youtube", "filesize_approx": 4096}"#;

/// Diagnostic printed for links no extractor handles
pub const UNSUPPORTED_STDERR: &str = "ERROR: Unsupported URL: https://example.com/nothing";

/// Shell snippet that resolves the `-o` template into `$out` like yt-dlp does
const RESOLVE_OUTPUT: &str = r#"out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) shift; out="$1" ;;
  esac
  shift
done
out=$(printf '%s' "$out" | sed -e 's/%(title)\.50s/Sunset_timelapse/' -e 's/%(ext)s/mp4/')
"#;

/// Behavior of the fake tool for the download invocation
#[derive(Debug, Clone)]
pub enum FetchBehavior {
    /// Write an artifact of this many bytes and report it
    Write(usize),
    /// Like `Write`, plus a leftover `.f140.m4a` audio stream beside it
    WriteWithAudioStream(usize),
    /// Exit 1 with the given stderr
    Fail(&'static str),
    /// Write a partial file, then sleep far past any test budget
    Hang,
}

/// Behavior of the fake tool for the metadata probe
#[derive(Debug, Clone)]
pub enum ProbeBehavior {
    /// Print this JSON record
    Json(&'static str),
    /// Exit 1 with the given stderr
    Fail(&'static str),
}

fn probe_body(probe: &ProbeBehavior) -> String {
    match probe {
        ProbeBehavior::Json(json) => format!("cat <<'JSON'\n{}\nJSON\nexit 0\n", json),
        ProbeBehavior::Fail(stderr) => format!("echo '{}' >&2\nexit 1\n", stderr),
    }
}

fn fetch_body(fetch: &FetchBehavior) -> String {
    match fetch {
        FetchBehavior::Write(bytes) => format!(
            "head -c {} /dev/zero > \"$out\"\necho \"[download] Destination: $out\"\n",
            bytes
        ),
        FetchBehavior::WriteWithAudioStream(bytes) => format!(
            "head -c {} /dev/zero > \"$out\"\nprintf 'audio' > \"${{out%.mp4}}.f140.m4a\"\n\
             echo \"[Merger] Merging formats into \\\"$out\\\"\"\n",
            bytes
        ),
        FetchBehavior::Fail(stderr) => format!("echo '{}' >&2\nexit 1\n", stderr),
        FetchBehavior::Hang => "printf 'partial' > \"$out\"\nexec sleep 60\n".to_string(),
    }
}

/// Write a fake yt-dlp script into `dir` and return a fetcher that runs it
pub fn fake_ytdlp_in(dir: &Path, probe: ProbeBehavior, fetch: FetchBehavior) -> YtDlpFetcher {
    let script = format!(
        "case \" $* \" in\n  *\" --version \"*) echo '2024.08.06'; exit 0 ;;\n  *\" --dump-json \"*)\n{}  ;;\nesac\n{}{}",
        probe_body(&probe),
        RESOLVE_OUTPUT,
        fetch_body(&fetch)
    );
    let path = dir.join("yt-dlp.sh");
    std::fs::write(&path, script).unwrap();
    YtDlpFetcher::with_launcher("/bin/sh", [path])
}

/// Fake yt-dlp in its own scratch directory (keep the `TempDir` alive)
pub fn fake_ytdlp(probe: ProbeBehavior, fetch: FetchBehavior) -> (YtDlpFetcher, TempDir) {
    let dir = TempDir::new().unwrap();
    let fetcher = fake_ytdlp_in(dir.path(), probe, fetch);
    (fetcher, dir)
}
