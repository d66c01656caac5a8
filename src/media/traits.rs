//! Trait for media fetch backends

use crate::context::RequestContext;
use crate::error::FetchError;
use crate::types::{FetchRequest, FetchResult, VideoInfo};
use async_trait::async_trait;

/// Trait for media fetch backends
///
/// Implementations run an external tool (or a stand-in in tests) bound to the
/// request's [`RequestContext`], so deadline expiry or shutdown aborts the work.
///
/// # Examples
///
/// ```no_run
/// use vidgrab::context::RequestContext;
/// use vidgrab::media::{MediaFetcher, YtDlpFetcher};
/// use vidgrab::types::FetchRequest;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = YtDlpFetcher::from_path().expect("yt-dlp not found");
/// let ctx = RequestContext::new(&CancellationToken::new(), Duration::from_secs(600));
///
/// let info = fetcher.probe_info("https://example.com/watch?v=abc", &ctx).await?;
/// println!("{} ({}s)", info.title, info.duration);
///
/// let request = FetchRequest {
///     url: "https://example.com/watch?v=abc".into(),
///     destination_dir: "downloads".into(),
///     max_size_mb: 50,
///     token: "6f1c2d".into(),
/// };
/// let result = fetcher.fetch_constrained(&request, &ctx).await?;
/// println!("saved {} bytes to {}", result.size_bytes, result.path.display());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch metadata without downloading the media
    ///
    /// # Errors
    ///
    /// - [`FetchError::Probe`] if the tool exits non-zero (carries its diagnostic)
    /// - [`FetchError::MalformedMetadata`] if the output is not a metadata record
    /// - [`FetchError::Interrupted`] if the request context expires
    async fn probe_info(&self, url: &str, ctx: &RequestContext) -> Result<VideoInfo, FetchError>;

    /// Download the media under the request's size ceiling and locate the artifact
    ///
    /// On success the artifact exists, starts with the request's prefix and is no
    /// larger than `max_size_mb`. On failure no file carrying the prefix is left
    /// behind.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Download`] if the tool exits non-zero
    /// - [`FetchError::ArtifactNotFound`] if the tool succeeded but no file could be located
    /// - [`FetchError::SizeExceeded`] if the artifact is over the limit (it is deleted)
    /// - [`FetchError::Io`] if the artifact cannot be inspected
    /// - [`FetchError::Interrupted`] if the request context expires
    async fn fetch_constrained(
        &self,
        request: &FetchRequest,
        ctx: &RequestContext,
    ) -> Result<FetchResult, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
