//! rss-notify — push a notification for every new item in an RSS feed.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ TaggedItem ┌──────────┐ DeliveryRequest ┌────────────┐
//! │ poll.rs  │ ─────────► │ dedup.rs │ ──────────────► │ deliver.rs │ ──► Pushover
//! └──────────┘            └──────────┘                 └────────────┘
//!      ▲ fetch + parse
//! ┌──────────┐
//! │ source/  │
//! └──────────┘
//! ```
//!
//! * **`source/`** — fetching (`HttpFetcher`) and parsing (`RssParser`) of
//!   the feed behind the `FeedFetcher` / `FeedParser` traits.
//! * **`notify/`** — the `Notifier` trait and the Pushover transport.
//! * **`poll`** — periodic fetch, tagging items with their poll cycle.
//! * **`dedup`** — owns the known-item set; turns new items into
//!   notifications, staying silent during the bootstrap cycle.
//! * **`deliver`** — sends notifications with bounded concurrency.
//! * **`pipeline`** — spawns and joins the three stages.
//! * **`shutdown`** — the cancellation signal and OS signal handling.
//! * **`startup`** — credential and feed validation before anything runs.
//! * **`main`** — wires everything together.

mod config;
mod dedup;
mod deliver;
mod error;
mod notify;
mod pipeline;
mod poll;
mod shutdown;
mod source;
mod startup;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config, LogFormat};
use notify::PushoverClient;
use pipeline::Collaborators;
use shutdown::{OsSignals, ShutdownSignal};
use source::{HttpFetcher, RssParser};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rss_notify=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load(&cli).context("loading configuration")?;
    init_tracing(config.log_format);
    if let Some(file) = &config.file {
        info!(file = %file.display(), "loaded config file");
    }

    info!(
        feed_url = %config.feed_url,
        poll_interval_secs = config.poll_interval,
        "rss-notify starting"
    );

    let collaborators = Collaborators {
        fetcher: Arc::new(HttpFetcher::new(&config.user_agent).context("building HTTP client")?),
        parser: Arc::new(RssParser::new()),
        notifier: Arc::new(
            PushoverClient::new(
                config.pushover_app_token.clone(),
                config.pushover_recipient.clone(),
                &config.user_agent,
            )
            .context("building Pushover client")?,
        ),
    };

    startup::validate(
        &*collaborators.notifier,
        &*collaborators.fetcher,
        &*collaborators.parser,
        &config.feed_url,
        &config.notification_title,
    )
    .await
    .context("startup validation failed")?;

    let mut signals = OsSignals::install().context("installing signal handlers")?;
    let shutdown = ShutdownSignal::new();
    let running = pipeline::spawn(config.pipeline_settings(), collaborators, &shutdown);

    let signal = signals.recv().await;
    info!(signal, "shutting down");
    shutdown.fire();

    let report = running.join().await.context("pipeline stage panicked")?;
    debug!(known = ?report.known.ids(), "final known items");
    info!(
        cycles = report.cycles,
        known = report.known.len(),
        sent = report.delivery.sent,
        failed = report.delivery.failed,
        "rss-notify stopped"
    );

    Ok(())
}
