//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "mini-music")]
#[command(about = "Terminal player for your Spotify liked songs")]
#[command(version)]
pub struct Config {
    /// Use the built-in fixture library instead of Spotify
    #[arg(long, env = "MINI_MUSIC_FIXTURES")]
    pub fixtures: bool,

    /// Directory for the daily log files
    #[arg(long, default_value = ".logs", env = "MINI_MUSIC_LOG_DIR")]
    pub log_dir: PathBuf,

    /// How often to poll Spotify for the current track, in milliseconds
    #[arg(long, default_value_t = 1000, env = "MINI_MUSIC_POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Preferred Spotify Connect device for playback
    #[arg(long, env = "MINI_MUSIC_DEVICE_NAME")]
    pub device_name: Option<String>,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }
}
