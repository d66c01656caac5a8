//! Formatting helpers for user-facing text and file names

/// Bytes in one megabyte as used for the size ceiling
pub const BYTES_PER_MB: u64 = 1_048_576;

/// Maximum length of a delivered file name stem, in characters
const MAX_FILENAME_CHARS: usize = 60;

/// Format a duration in seconds as `MM:SS`, or `HH:MM:SS` when at least an hour
///
/// Fractional seconds are truncated.
///
/// # Examples
///
/// ```
/// use vidgrab::utils::format_duration;
///
/// assert_eq!(format_duration(75.9), "01:15");
/// assert_eq!(format_duration(3725.0), "01:02:05");
/// ```
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let h = total / 3600;
    let m = (total / 60) % 60;
    let s = total % 60;

    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// Format a byte count with binary units (`512 B`, `1.5 KB`, `20.0 MB`)
///
/// # Examples
///
/// ```
/// use vidgrab::utils::format_file_size;
///
/// assert_eq!(format_file_size(512), "512 B");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < PREFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}

/// Escape the characters Telegram's legacy Markdown treats as markup
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | ']' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Turn a media title into a safe file name stem
///
/// Path separators and characters reserved on common filesystems are replaced by
/// `_`, the result is cut to 60 characters and trimmed. Falls back to `"video"`
/// when nothing usable remains.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_FILENAME_CHARS)
        .collect();

    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Cap a diagnostic at `limit` characters, appending `...` when it was cut
///
/// Cuts on a character boundary so multi-byte text never splits.
#[must_use]
pub fn truncate_diagnostic(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}
