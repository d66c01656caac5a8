use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};
use vidgrab::{Bot, Config, TelegramClient, YtDlpFetcher, run_with_shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; variables may come from the environment
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "bot exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> vidgrab::Result<()> {
    let config = Arc::new(Config::from_env()?);
    config.prepare_download_dir().await?;

    let Some(fetcher) = YtDlpFetcher::from_config(&config.tools) else {
        return Err(vidgrab::Error::ExternalTool(
            "yt-dlp not found in PATH. Install it: https://github.com/yt-dlp/yt-dlp#installation"
                .to_string(),
        ));
    };
    let version = fetcher.version().await?;
    tracing::info!(version = %version, "yt-dlp available");

    let client = Arc::new(TelegramClient::from_config(&config.telegram)?);
    let me = client.get_me().await?;
    tracing::info!(
        username = me.username.as_deref().unwrap_or("unknown"),
        download_dir = %config.download.download_dir.display(),
        max_file_size_mb = config.download.max_file_size_mb,
        allowed_users = config.access.allowed_users.len(),
        "starting video download bot"
    );

    let bot = Bot::new(config, client, Arc::new(fetcher));
    run_with_shutdown(bot).await
}
