//! Command-line, environment and config-file configuration.
//!
//! Settings are layered, highest precedence first:
//!
//! 1. command-line flags
//! 2. `RSS_NOTIFY_*` environment variables (`main` loads a `.env` file
//!    first, so the variables can also live there)
//! 3. a config file: `--config <path>`, or else `rss-notify.toml` /
//!    `rss-notify.yaml` in the working directory when present
//! 4. built-in defaults
//!
//! Clap gathers layers 1 and 2; the `config` crate merges them over the file
//! and the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use ::config::{ConfigError, File};
use serde::Deserialize;

use crate::pipeline::PipelineSettings;

/// Default poll interval, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;

/// Base name of the config file looked up in the working directory.
const DEFAULT_FILE_STEM: &str = "rss-notify";
const DEFAULT_FILE_EXTENSIONS: [&str; 3] = ["toml", "yaml", "yml"];

const MAX_DELIVERY_CONCURRENCY: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

/// Send a Pushover notification whenever a new item shows up in an RSS feed.
///
/// Every option is optional here; missing values fall back to the config
/// file and then to the defaults, and required ones are checked by
/// [`Config::load`].
#[derive(Debug, Clone, Parser)]
#[command(name = "rss-notify", version, about)]
pub struct Cli {
    /// Config file to read (TOML or YAML).  Without it, `rss-notify.toml` or
    /// `rss-notify.yaml` in the working directory is used if present.
    #[arg(short = 'c', long, env = "RSS_NOTIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// URL of the RSS feed to watch.
    #[arg(short = 'f', long, env = "RSS_NOTIFY_FEED_URL")]
    pub feed_url: Option<String>,

    /// Pushover application API token.
    #[arg(short = 't', long, env = "RSS_NOTIFY_PUSHOVER_APP_TOKEN", hide_env_values = true)]
    pub pushover_app_token: Option<String>,

    /// Pushover user or group key that receives the notifications.
    #[arg(short = 'r', long, env = "RSS_NOTIFY_PUSHOVER_RECIPIENT", hide_env_values = true)]
    pub pushover_recipient: Option<String>,

    /// Seconds between polls of the feed [default: 120].
    #[arg(
        short = 'p',
        long,
        env = "RSS_NOTIFY_POLL_INTERVAL",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval: Option<u64>,

    /// Title shown on every notification [default: rss-notify].
    #[arg(long, env = "RSS_NOTIFY_NOTIFICATION_TITLE")]
    pub notification_title: Option<String>,

    /// Capacity of the queue between the poller and the dedup stage [default: 256].
    #[arg(long, env = "RSS_NOTIFY_ITEM_QUEUE_CAPACITY", value_parser = clap::value_parser!(u64).range(1..))]
    pub item_queue_capacity: Option<u64>,

    /// Capacity of the queue between the dedup stage and delivery [default: 64].
    #[arg(long, env = "RSS_NOTIFY_DELIVERY_QUEUE_CAPACITY", value_parser = clap::value_parser!(u64).range(1..))]
    pub delivery_queue_capacity: Option<u64>,

    /// Maximum number of notifications being sent at once [default: 1].
    #[arg(
        long,
        env = "RSS_NOTIFY_DELIVERY_CONCURRENCY",
        value_parser = clap::value_parser!(u64).range(1..=64)
    )]
    pub delivery_concurrency: Option<u64>,

    /// User-Agent sent with feed and notification requests.
    #[arg(long, env = "RSS_NOTIFY_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Log output format [default: text].
    #[arg(long, env = "RSS_NOTIFY_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed_url: String,
    pub pushover_app_token: String,
    pub pushover_recipient: String,
    pub poll_interval: u64,
    pub notification_title: String,
    pub item_queue_capacity: u64,
    pub delivery_queue_capacity: u64,
    pub delivery_concurrency: u64,
    pub user_agent: String,
    pub log_format: LogFormat,

    /// Config file the settings were read from, if any.
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

impl Config {
    /// Resolve settings from `cli`, the config file and the defaults,
    /// looking for the default config file in the working directory.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_from_dir(cli, Path::new("."))
    }

    fn load_from_dir(cli: &Cli, dir: &Path) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => Some(path.clone()),
            None => find_default_file(dir),
        };

        let mut builder = ::config::Config::builder()
            .set_default("poll_interval", DEFAULT_POLL_INTERVAL_SECS)?
            .set_default("notification_title", "rss-notify")?
            .set_default("item_queue_capacity", 256_u64)?
            .set_default("delivery_queue_capacity", 64_u64)?
            .set_default("delivery_concurrency", 1_u64)?
            .set_default("user_agent", concat!("rss-notify/", env!("CARGO_PKG_VERSION")))?
            .set_default("log_format", LogFormat::Text.as_str())?;

        if let Some(path) = &file {
            // An explicit --config must exist; the discovered one does by construction.
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let mut config: Config = builder
            .set_override_option("feed_url", cli.feed_url.clone())?
            .set_override_option("pushover_app_token", cli.pushover_app_token.clone())?
            .set_override_option("pushover_recipient", cli.pushover_recipient.clone())?
            .set_override_option("poll_interval", cli.poll_interval)?
            .set_override_option("notification_title", cli.notification_title.clone())?
            .set_override_option("item_queue_capacity", cli.item_queue_capacity)?
            .set_override_option("delivery_queue_capacity", cli.delivery_queue_capacity)?
            .set_override_option("delivery_concurrency", cli.delivery_concurrency)?
            .set_override_option("user_agent", cli.user_agent.clone())?
            .set_override_option("log_format", cli.log_format.map(LogFormat::as_str))?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        config.file = file;
        Ok(config)
    }

    /// Range checks for values that may have come from the file, where clap
    /// never saw them.
    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("poll_interval", self.poll_interval),
            ("item_queue_capacity", self.item_queue_capacity),
            ("delivery_queue_capacity", self.delivery_queue_capacity),
            ("delivery_concurrency", self.delivery_concurrency),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Message(format!("{key} must be at least 1")));
        }
        if self.delivery_concurrency > MAX_DELIVERY_CONCURRENCY {
            return Err(ConfigError::Message(format!(
                "delivery_concurrency must be at most {MAX_DELIVERY_CONCURRENCY}"
            )));
        }
        for (key, value) in [
            ("feed_url", &self.feed_url),
            ("pushover_app_token", &self.pushover_app_token),
            ("pushover_recipient", &self.pushover_recipient),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            feed_url: self.feed_url.clone(),
            poll_interval: self.poll_interval(),
            notification_title: self.notification_title.clone(),
            item_queue_capacity: self.item_queue_capacity as usize,
            delivery_queue_capacity: self.delivery_queue_capacity as usize,
            delivery_concurrency: self.delivery_concurrency as usize,
        }
    }
}

/// First `rss-notify.<ext>` that exists in `dir`.
fn find_default_file(dir: &Path) -> Option<PathBuf> {
    DEFAULT_FILE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{DEFAULT_FILE_STEM}.{ext}")))
        .find(|path| path.is_file())
}
