//! Background feed polling.
//!
//! The poller runs on its own task. On a fixed interval it fetches and
//! parses the feed, tags every item with the ordinal of the cycle that
//! produced it, and sends the items one by one to the dedup stage.
//!
//! Cycle `0` is the bootstrap cycle.  A cycle only counts once it has
//! succeeded: a failed fetch or parse is logged and skipped without
//! advancing the counter, so a bootstrap that fails is retried as cycle `0`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

use crate::shutdown::ShutdownListener;
use crate::source::{self, FeedFetcher, FeedParser, TaggedItem};

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    /// All items were handed to the dedup stage.
    Emitted(usize),
    /// Fetch or parse failed; nothing was emitted.
    Skipped,
    /// Shutdown fired or the dedup stage went away mid-emission.
    Halted,
}

pub struct FeedPoller {
    url: String,
    interval: Duration,
    fetcher: Arc<dyn FeedFetcher>,
    parser: Arc<dyn FeedParser>,
    cycle: u64,
}

impl FeedPoller {
    pub fn new(
        url: impl Into<String>,
        interval: Duration,
        fetcher: Arc<dyn FeedFetcher>,
        parser: Arc<dyn FeedParser>,
    ) -> Self {
        Self {
            url: url.into(),
            interval,
            fetcher,
            parser,
            cycle: 0,
        }
    }

    /// Poll until shutdown fires.  Returns the number of successful cycles.
    ///
    /// The first cycle runs immediately; later ones follow the interval.  An
    /// in-flight fetch is allowed to finish, but no new one starts once the
    /// shutdown signal has fired.
    pub async fn run(
        mut self,
        items: mpsc::Sender<TaggedItem>,
        mut shutdown: ShutdownListener,
    ) -> u64 {
        info!(
            url = %self.url,
            interval_secs = self.interval.as_secs(),
            "starting poller"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => match self.run_cycle(&items, &mut shutdown).await {
                    CycleOutcome::Emitted(count) => trace!(cycle = self.cycle, count, "cycle complete"),
                    CycleOutcome::Skipped => {}
                    CycleOutcome::Halted => break,
                },
            }
        }

        info!(cycles = self.cycle, "poller stopped");
        self.cycle
    }

    async fn run_cycle(
        &mut self,
        items: &mpsc::Sender<TaggedItem>,
        shutdown: &mut ShutdownListener,
    ) -> CycleOutcome {
        trace!(cycle = self.cycle, "checking for new items");

        let feed = match source::fetch_items(&*self.fetcher, &*self.parser, &self.url).await {
            Ok(feed) => feed,
            Err(e) => {
                error!(cycle = self.cycle, error = %e, "poll failed, skipping cycle");
                return CycleOutcome::Skipped;
            }
        };

        let total = feed.len();
        debug!(cycle = self.cycle, total, "parsed feed");

        for item in feed {
            let tagged = TaggedItem::new(self.cycle, item);
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return CycleOutcome::Halted,
                sent = items.send(tagged) => {
                    if sent.is_err() {
                        debug!("dedup stage is gone, stopping poller");
                        return CycleOutcome::Halted;
                    }
                }
            }
        }

        self.cycle += 1;
        CycleOutcome::Emitted(total)
    }
}
