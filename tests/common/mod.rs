//! Common test utilities for vidgrab integration tests

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod messenger;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use messenger::*;

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vidgrab::{Config, MediaFetcher, Messenger, RequestOrchestrator};

/// Config writing into a fresh download directory
#[allow(dead_code)]
pub fn test_config(max_file_size_mb: u64, request_timeout: Duration) -> (Config, TempDir) {
    let downloads = TempDir::new().unwrap();
    let mut config = Config::default();
    config.telegram.bot_token = "123:TEST".to_string();
    config.download.download_dir = downloads.path().to_path_buf();
    config.download.max_file_size_mb = max_file_size_mb;
    config.download.request_timeout = request_timeout;
    (config, downloads)
}

/// Orchestrator over the given fetcher and messenger
#[allow(dead_code)]
pub fn build_orchestrator(
    config: Config,
    fetcher: Arc<dyn MediaFetcher>,
    messenger: Arc<dyn Messenger>,
) -> RequestOrchestrator {
    RequestOrchestrator::new(Arc::new(config), fetcher, messenger)
}
