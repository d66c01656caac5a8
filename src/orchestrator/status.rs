//! Status message texts

use crate::types::VideoInfo;
use crate::utils::{escape_markdown, format_duration, format_file_size, truncate_diagnostic};

/// Title characters kept in a caption
///
/// The Bot API caps captions at 1024 UTF-16 units; even a title made only of
/// astral-plane characters stays under that with the size line appended.
const CAPTION_TITLE_CHARS: usize = 480;

/// Shown while the metadata probe runs
pub fn fetching_text() -> &'static str {
    "🔍 Fetching video info..."
}

/// Shown while the download runs (Markdown)
///
/// Title and source are escaped; the duration line is omitted when unknown
/// and the source line when the extractor is not reported.
pub fn info_text(info: &VideoInfo) -> String {
    let mut text = format!("📹 *{}*\n", escape_markdown(&info.title));
    if info.has_duration() {
        text.push_str(&format!("⏱ Duration: {}\n", format_duration(info.duration)));
    }
    if !info.extractor.is_empty() {
        text.push_str(&format!("🌐 Source: {}\n", escape_markdown(&info.extractor)));
    }
    text.push_str("\n⬇️ Downloading video...");
    text
}

/// Shown while the artifact is uploaded
pub fn uploading_text() -> &'static str {
    "📤 Uploading video..."
}

/// Caption attached to the delivered file
pub(crate) fn caption(info: &VideoInfo, size_bytes: u64) -> String {
    format!(
        "🎬 {}\n📦 {}",
        truncate_diagnostic(&info.title, CAPTION_TITLE_CHARS),
        format_file_size(size_bytes)
    )
}
