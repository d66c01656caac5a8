//! yt-dlp backed media fetcher

use super::parser::{FetchOutcome, diagnostic, parse_video_info, reported_destinations};
use super::resolve::{remove_prefixed, resolve_artifact};
use super::traits::MediaFetcher;
use crate::config::ToolsConfig;
use crate::context::RequestContext;
use crate::error::{Error, FetchError};
use crate::types::{FetchRequest, FetchResult, VideoInfo};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Container every download is normalized to
pub const CONTAINER: &str = "mp4";

/// Title characters kept in the output template
const TITLE_CHARS: usize = 50;

/// Media fetcher that shells out to `yt-dlp`
///
/// # Examples
///
/// ```no_run
/// use vidgrab::media::YtDlpFetcher;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let fetcher = YtDlpFetcher::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let fetcher = YtDlpFetcher::from_path().expect("yt-dlp not in PATH");
///
/// // Or run the Python module
/// let fetcher = YtDlpFetcher::with_launcher("python3", ["-m", "yt_dlp"]);
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl YtDlpFetcher {
    /// Create a fetcher with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            program: binary_path,
            leading_args: Vec::new(),
        }
    }

    /// Create a fetcher that runs `program` with `leading_args` before the yt-dlp arguments
    pub fn with_launcher<P, I, S>(program: P, leading_args: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build a fetcher from tool configuration
    ///
    /// An explicit `ytdlp_path` wins; otherwise PATH is searched when
    /// `search_path` is enabled.
    pub fn from_config(tools: &ToolsConfig) -> Option<Self> {
        match &tools.ytdlp_path {
            Some(path) => Some(Self::new(path.clone())),
            None if tools.search_path => Self::from_path(),
            None => None,
        }
    }

    /// Report the installed yt-dlp version (`yt-dlp --version`)
    pub async fn version(&self) -> crate::Result<String> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(Error::ExternalTool(diagnostic(
                &output.stderr,
                &output.status.to_string(),
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, args: Vec<OsString>, ctx: &RequestContext) -> Result<Output, FetchError> {
        debug!(program = ?self.program, ?args, "running yt-dlp");
        let mut cmd = self.command();
        cmd.args(args);
        match ctx.run(cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(FetchError::Spawn(e.to_string())),
            Err(interrupted) => Err(interrupted.into()),
        }
    }

    /// Classify a finished fetch invocation
    async fn interpret(&self, request: &FetchRequest, output: &Output) -> FetchOutcome {
        if !output.status.success() {
            return FetchOutcome::Failed(diagnostic(&output.stderr, &output.status.to_string()));
        }

        let reported = reported_destinations(&output.stdout);
        match resolve_artifact(
            &request.destination_dir,
            &request.prefix(),
            CONTAINER,
            &reported,
        )
        .await
        {
            Some(path) => FetchOutcome::Resolved(path),
            None => FetchOutcome::Unresolved,
        }
    }

    /// Stat the artifact and enforce the size ceiling
    async fn verify(
        &self,
        request: &FetchRequest,
        path: PathBuf,
    ) -> Result<FetchResult, FetchError> {
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
        let size_bytes = meta.len();

        if size_bytes > request.max_size_bytes() {
            warn!(
                ?path,
                size_bytes,
                limit_mb = request.max_size_mb,
                "artifact exceeds size limit, deleting"
            );
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(?path, error = %e, "failed to delete oversized artifact");
            }
            return Err(FetchError::SizeExceeded {
                size_bytes,
                limit_mb: request.max_size_mb,
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(FetchResult {
            path,
            size_bytes,
            file_name,
        })
    }
}

/// Arguments for the metadata-only probe
pub fn probe_args(url: &str) -> Vec<OsString> {
    ["--dump-json", "--no-playlist", "--no-warnings", "--", url]
        .into_iter()
        .map(OsString::from)
        .collect()
}

/// Format selection: best single file under the limit, then best video+audio
/// under the limit, then whatever is best
pub fn format_selector(max_size_mb: u64) -> String {
    format!(
        "best[filesize<{mb}M]/bestvideo[filesize<{mb}M]+bestaudio/best",
        mb = max_size_mb
    )
}

/// Output template `<dir>/<token>_<title, 50 chars>.<ext>`
pub fn output_template(dir: &Path, token: &str) -> PathBuf {
    dir.join(format!("{}_%(title).{}s.%(ext)s", token, TITLE_CHARS))
}

/// Arguments for the constrained fetch
pub fn fetch_args(request: &FetchRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(18);
    args.push("-o".into());
    args.push(output_template(&request.destination_dir, &request.token).into());
    args.push("-f".into());
    args.push(format_selector(request.max_size_mb).into());
    for flag in [
        "--merge-output-format",
        CONTAINER,
        "--recode-video",
        CONTAINER,
        "--restrict-filenames",
        "--no-playlist",
        "--no-warnings",
        "--no-part",
        "--no-embed-thumbnail",
        "--",
    ] {
        args.push(flag.into());
    }
    args.push(request.url.as_str().into());
    args
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn probe_info(&self, url: &str, ctx: &RequestContext) -> Result<VideoInfo, FetchError> {
        info!(url, "probing video info");
        let output = self.run(probe_args(url), ctx).await?;

        if !output.status.success() {
            return Err(FetchError::Probe {
                diagnostic: diagnostic(&output.stderr, &output.status.to_string()),
            });
        }
        parse_video_info(&output.stdout)
    }

    async fn fetch_constrained(
        &self,
        request: &FetchRequest,
        ctx: &RequestContext,
    ) -> Result<FetchResult, FetchError> {
        info!(
            url = %request.url,
            token = %request.token,
            max_size_mb = request.max_size_mb,
            "downloading video"
        );

        let output = match self.run(fetch_args(request), ctx).await {
            Ok(output) => output,
            Err(e) => {
                remove_prefixed(&request.destination_dir, &request.prefix()).await;
                return Err(e);
            }
        };

        let result = match self.interpret(request, &output).await {
            FetchOutcome::Resolved(path) => self.verify(request, path).await,
            FetchOutcome::Failed(diagnostic) => Err(FetchError::Download { diagnostic }),
            FetchOutcome::Unresolved => Err(FetchError::ArtifactNotFound {
                prefix: request.prefix(),
                dir: request.destination_dir.clone(),
            }),
        };

        if result.is_err() {
            remove_prefixed(&request.destination_dir, &request.prefix()).await;
        }
        result
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
