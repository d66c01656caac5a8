//! Configuration types for vidgrab

use crate::error::{Error, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tracing::warn;

/// Longest accepted per-request budget
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted `getUpdates` long-poll timeout
pub const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Bot API connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot credential from @BotFather (required)
    #[serde(default)]
    pub bot_token: String,

    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Long-poll timeout for `getUpdates` (default: 30 seconds)
    #[serde(default = "default_poll_timeout", with = "duration_serde")]
    pub poll_timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: default_api_url(),
            poll_timeout: default_poll_timeout(),
        }
    }
}

/// Download behavior configuration (directory, size ceiling, time budget)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory artifacts are written to (default: "<tmp>/video-bot-downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum artifact size in MB (default: 50, the Bot API upload limit)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Wall-clock budget for one request, probe through delivery (default: 10 minutes)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Maximum number of diagnostic characters shown to users (default: 300)
    #[serde(default = "default_error_display_limit")]
    pub error_display_limit: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_file_size_mb: default_max_file_size_mb(),
            request_timeout: default_request_timeout(),
            error_display_limit: default_error_display_limit(),
        }
    }
}

/// External tool settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
        }
    }
}

/// Access control
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Users allowed to use the bot (empty = everyone)
    #[serde(default)]
    pub allowed_users: Vec<UserId>,
}

/// Main configuration for the bot
///
/// Sub-configs are flattened so the serialized form stays a single flat table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bot API settings
    #[serde(flatten)]
    pub telegram: TelegramConfig,

    /// Download behavior
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Access control
    #[serde(flatten)]
    pub access: AccessConfig,
}

impl Config {
    /// Load configuration from process environment variables
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `TELEGRAM_BOT_TOKEN` | bot credential (required) |
    /// | `DOWNLOAD_DIR` | artifact directory |
    /// | `MAX_FILE_SIZE_MB` | size ceiling; invalid or non-positive values keep the default |
    /// | `ALLOWED_USERS` | comma-separated user ids |
    /// | `YTDLP_PATH` | explicit yt-dlp path |
    /// | `REQUEST_TIMEOUT_SECS` | per-request budget |
    /// | `POLL_TIMEOUT_SECS` | `getUpdates` long-poll timeout |
    /// | `TELEGRAM_API_URL` | Bot API base URL |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Config::default();

        config.telegram.bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| Error::Config {
            message: "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            key: Some("TELEGRAM_BOT_TOKEN".to_string()),
        })?;

        if let Some(url) = get("TELEGRAM_API_URL") {
            config.telegram.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) =
            get("POLL_TIMEOUT_SECS").and_then(|s| parse_positive("POLL_TIMEOUT_SECS", &s))
        {
            config.telegram.poll_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = get("DOWNLOAD_DIR") {
            config.download.download_dir = PathBuf::from(dir);
        }
        if let Some(mb) =
            get("MAX_FILE_SIZE_MB").and_then(|s| parse_positive("MAX_FILE_SIZE_MB", &s))
        {
            config.download.max_file_size_mb = mb;
        }
        if let Some(secs) =
            get("REQUEST_TIMEOUT_SECS").and_then(|s| parse_positive("REQUEST_TIMEOUT_SECS", &s))
        {
            config.download.request_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = get("YTDLP_PATH") {
            config.tools.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Some(users) = get("ALLOWED_USERS") {
            config.access.allowed_users = parse_user_ids(&users);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(Error::Config {
                message: "bot token must not be empty".to_string(),
                key: Some("bot_token".to_string()),
            });
        }
        if self.download.max_file_size_mb == 0 {
            return Err(Error::Config {
                message: "max_file_size_mb must be positive".to_string(),
                key: Some("max_file_size_mb".to_string()),
            });
        }
        if self.download.request_timeout.is_zero()
            || self.download.request_timeout > MAX_REQUEST_TIMEOUT
        {
            return Err(Error::Config {
                message: format!(
                    "request_timeout must be between 1 and {} seconds",
                    MAX_REQUEST_TIMEOUT.as_secs()
                ),
                key: Some("request_timeout".to_string()),
            });
        }
        if self.telegram.poll_timeout > MAX_POLL_TIMEOUT {
            return Err(Error::Config {
                message: format!(
                    "poll_timeout must be at most {} seconds",
                    MAX_POLL_TIMEOUT.as_secs()
                ),
                key: Some("poll_timeout".to_string()),
            });
        }
        if url::Url::parse(&self.telegram.api_url).is_err() {
            return Err(Error::Config {
                message: format!("invalid API URL: {}", self.telegram.api_url),
                key: Some("api_url".to_string()),
            });
        }
        Ok(())
    }

    /// Create the download directory if it does not exist yet
    pub async fn prepare_download_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.download.download_dir)
            .await
            .map_err(|e| Error::Config {
                message: format!(
                    "failed to create download directory {}: {}",
                    self.download.download_dir.display(),
                    e
                ),
                key: Some("download_dir".to_string()),
            })
    }

    /// Whether `user` may use the bot
    pub fn is_allowed(&self, user: UserId) -> bool {
        self.access.allowed_users.is_empty() || self.access.allowed_users.contains(&user)
    }
}

/// Parse a comma-separated list of user ids, skipping blank or invalid entries
pub fn parse_user_ids(raw: &str) -> Vec<UserId> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.parse::<i64>() {
            Ok(id) => Some(UserId(id)),
            Err(_) => {
                warn!(entry = part, "ignoring invalid user id in ALLOWED_USERS");
                None
            }
        })
        .collect()
}

fn parse_positive(key: &str, raw: &str) -> Option<u64> {
    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(key, value = raw, "ignoring invalid value, using default");
            None
        }
    }
}

// Default value functions
fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_dir() -> PathBuf {
    std::env::temp_dir().join("video-bot-downloads")
}

fn default_max_file_size_mb() -> u64 {
    50
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_error_display_limit() -> usize {
    300
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn token_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("TELEGRAM_BOT_TOKEN")),
            other => panic!("expected Config error, got {:?}", other),
        }

        // Whitespace-only counts as missing
        assert!(Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout, Duration::from_secs(30));
        assert_eq!(config.download.max_file_size_mb, 50);
        assert_eq!(config.download.request_timeout, Duration::from_secs(600));
        assert_eq!(config.download.error_display_limit, 300);
        assert!(config.download.download_dir.ends_with("video-bot-downloads"));
        assert!(config.tools.ytdlp_path.is_none());
        assert!(config.access.allowed_users.is_empty());
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("DOWNLOAD_DIR", "/data/videos"),
            ("MAX_FILE_SIZE_MB", "20"),
            ("ALLOWED_USERS", "42, 7 ,,abc, 99"),
            ("YTDLP_PATH", "/opt/yt-dlp"),
            ("REQUEST_TIMEOUT_SECS", "120"),
            ("TELEGRAM_API_URL", "http://localhost:8081/"),
        ]))
        .unwrap();

        assert_eq!(config.download.download_dir, PathBuf::from("/data/videos"));
        assert_eq!(config.download.max_file_size_mb, 20);
        assert_eq!(
            config.access.allowed_users,
            vec![UserId(42), UserId(7), UserId(99)]
        );
        assert_eq!(config.tools.ytdlp_path, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(config.download.request_timeout, Duration::from_secs(120));
        assert_eq!(config.telegram.api_url, "http://localhost:8081");
    }

    #[test]
    fn invalid_max_size_falls_back_to_default() {
        for raw in ["0", "-5", "lots"] {
            let config = Config::from_lookup(lookup(&[
                ("TELEGRAM_BOT_TOKEN", "t"),
                ("MAX_FILE_SIZE_MB", raw),
            ]))
            .unwrap();
            assert_eq!(config.download.max_file_size_mb, 50, "input {:?}", raw);
        }
    }

    #[test]
    fn allow_list_semantics() {
        let mut config = Config::default();
        assert!(config.is_allowed(UserId(1)), "empty list allows everyone");

        config.access.allowed_users = vec![UserId(42)];
        assert!(config.is_allowed(UserId(42)));
        assert!(!config.is_allowed(UserId(1)));
    }

    #[test]
    fn validate_rejects_bad_api_url() {
        let mut config = Config::default();
        config.telegram.bot_token = "t".into();
        config.telegram.api_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_flat_json() {
        let json = r#"{
            "bot_token": "t",
            "download_dir": "/srv/dl",
            "max_file_size_mb": 10,
            "request_timeout": 60,
            "allowed_users": [1, 2]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.download.max_file_size_mb, 10);
        assert_eq!(config.download.request_timeout, Duration::from_secs(60));
        assert_eq!(config.access.allowed_users, vec![UserId(1), UserId(2)]);
        assert_eq!(config.telegram.poll_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn prepare_download_dir_creates_nested_directory() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.download.download_dir = temp.path().join("a").join("b");

        config.prepare_download_dir().await.unwrap();
        assert!(config.download.download_dir.is_dir());
    }

    #[test]
    fn oversized_timeouts_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("REQUEST_TIMEOUT_SECS", "18446744073709551615"),
        ]))
        .unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("request_timeout")),
            other => panic!("expected Config error, got {:?}", other),
        }

        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("POLL_TIMEOUT_SECS", "18446744073709551615"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "poll_timeout"));

        // The ceiling itself is accepted
        let secs = MAX_REQUEST_TIMEOUT.as_secs().to_string();
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("REQUEST_TIMEOUT_SECS", secs.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.download.request_timeout, MAX_REQUEST_TIMEOUT);
    }

    #[test]
    fn debug_output_redacts_token() {
        let config =
            Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:SECRET")])).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("SECRET"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("api.telegram.org"));
    }
}
