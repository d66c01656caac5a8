//! Media fetching through an external download tool
//!
//! The core abstraction is the [`MediaFetcher`] trait, implemented by
//! [`YtDlpFetcher`] which shells out to `yt-dlp`. Each request invokes the tool
//! twice: a metadata-only probe, then a download constrained by a size ceiling.
//!
//! ## Artifact resolution
//!
//! yt-dlp does not reliably report the final file name (merging, recoding and
//! filename restriction all rename it), so every download is written under a
//! per-request token prefix and located afterwards:
//!
//! 1. a regular file in the destination directory starting with `<token>_`
//! 2. otherwise the last existing path mentioned in the tool's output
//! 3. otherwise [`FetchError::ArtifactNotFound`](crate::error::FetchError::ArtifactNotFound)
//!
//! ## Usage
//!
//! ```no_run
//! use vidgrab::context::RequestContext;
//! use vidgrab::media::{MediaFetcher, YtDlpFetcher};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = YtDlpFetcher::from_path().expect("yt-dlp binary not found");
//!     println!("yt-dlp {}", fetcher.version().await?);
//!
//!     let ctx = RequestContext::new(&CancellationToken::new(), Duration::from_secs(60));
//!     let info = fetcher.probe_info("https://vimeo.com/76979871", &ctx).await?;
//!     println!("{} from {}", info.title, info.extractor);
//!     Ok(())
//! }
//! ```

mod parser;
mod resolve;
mod traits;
mod ytdlp;

pub use parser::{FetchOutcome, parse_video_info, reported_destinations};
pub use resolve::{remove_prefixed, resolve_artifact};
pub use traits::MediaFetcher;
pub use ytdlp::{
    CONTAINER, YtDlpFetcher, fetch_args, format_selector, output_template, probe_args,
};
