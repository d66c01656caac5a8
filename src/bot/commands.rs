//! Bot commands and their replies

/// A recognized bot command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`: greeting and supported platforms
    Start,
    /// `/help`: usage and limits
    Help,
}

impl Command {
    /// Recognize a command at the start of `text`
    ///
    /// Accepts the `/command@botname` form used in group chats. Anything else,
    /// including unknown commands, is not a command and goes to URL handling.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _)| name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Reply to `/start` (Markdown)
pub fn start_text() -> &'static str {
    "🎬 *Video Download Bot*

Welcome! I can download videos from many platforms.

*How to use:*
Send me a video link and I will download it and send it back to you.

*Supported platforms:*
🔴 YouTube
🟢 Doodstream / Dood
🔵 Videy
🟡 Dailymotion
🟣 Vimeo
⚫ TikTok
🟠 Instagram
📌 Twitter/X
📎 Facebook
🎵 SoundCloud (audio)
And many more!

Type /help for more information."
}

/// Reply to `/help` (Markdown), quoting the configured size ceiling
pub fn help_text(max_file_size_mb: u64) -> String {
    format!(
        "📖 *Usage Guide*

1️⃣ Copy a video link from your browser or app
2️⃣ Paste it and send it to this bot
3️⃣ Wait for the download to finish
4️⃣ The video is sent to your chat

⚠️ *Limits:*
• Maximum file size: {mb} MB
• Video length is not limited (but the file must be < {mb} MB)
• One download at a time

💡 *Tips:*
• Make sure the link is valid and publicly accessible
• Short videos are processed faster
• If a download fails, try again a bit later

🔧 *Commands:*
/start - Start the bot
/help - Show this help",
        mb = max_file_size_mb
    )
}
