//! Wiring of the three pipeline stages.
//!
//! ```text
//! ┌──────────┐ TaggedItem ┌──────────┐ DeliveryRequest ┌───────────┐
//! │ poll.rs  │ ─────────► │ dedup.rs │ ──────────────► │ deliver.rs│
//! │ (task)   │  (bounded) │ (task)   │    (bounded)    │ (task)    │
//! └──────────┘            └──────────┘                 └───────────┘
//!       ▲                       ▲                            ▲
//!       └─────────── ShutdownListener (one per stage) ───────┘
//! ```
//!
//! Both channels are bounded.  A full item queue holds the poller back and
//! a full delivery queue holds the dedup stage back; either wait ends as
//! soon as shutdown fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::Instrument;

use crate::dedup::{DedupCoordinator, KnownItems};
use crate::deliver::{DeliveryStats, DeliveryWorker};
use crate::notify::Notifier;
use crate::poll::FeedPoller;
use crate::shutdown::ShutdownSignal;
use crate::source::{FeedFetcher, FeedParser};

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub feed_url: String,
    pub poll_interval: Duration,
    pub notification_title: String,
    pub item_queue_capacity: usize,
    pub delivery_queue_capacity: usize,
    pub delivery_concurrency: usize,
}

/// The external collaborators the pipeline drives.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn FeedFetcher>,
    pub parser: Arc<dyn FeedParser>,
    pub notifier: Arc<dyn Notifier>,
}

/// What the stages handed back once they all stopped.
#[derive(Debug)]
pub struct PipelineReport {
    pub cycles: u64,
    pub known: KnownItems,
    pub delivery: DeliveryStats,
}

/// Handles to the three running stage tasks.
pub struct RunningPipeline {
    poller: JoinHandle<u64>,
    dedup: JoinHandle<KnownItems>,
    delivery: JoinHandle<DeliveryStats>,
}

/// Spawn the poller, dedup coordinator and delivery worker.
///
/// Each stage gets its own listener on `shutdown`; the pipeline runs until
/// it fires.
pub fn spawn(
    settings: PipelineSettings,
    collaborators: Collaborators,
    shutdown: &ShutdownSignal,
) -> RunningPipeline {
    let (item_tx, item_rx) = mpsc::channel(settings.item_queue_capacity.max(1));
    let (delivery_tx, delivery_rx) = mpsc::channel(settings.delivery_queue_capacity.max(1));

    let poller = FeedPoller::new(
        settings.feed_url,
        settings.poll_interval,
        collaborators.fetcher,
        collaborators.parser,
    );
    let dedup = DedupCoordinator::new(settings.notification_title);
    let delivery = DeliveryWorker::new(collaborators.notifier, settings.delivery_concurrency);

    RunningPipeline {
        poller: tokio::spawn(
            poller
                .run(item_tx, shutdown.subscribe())
                .instrument(tracing::info_span!("poller")),
        ),
        dedup: tokio::spawn(
            dedup
                .run(item_rx, delivery_tx, shutdown.subscribe())
                .instrument(tracing::info_span!("dedup")),
        ),
        delivery: tokio::spawn(
            delivery
                .run(delivery_rx, shutdown.subscribe())
                .instrument(tracing::info_span!("delivery")),
        ),
    }
}

impl RunningPipeline {
    /// Wait for every stage to finish.
    ///
    /// All three tasks are awaited before any failure is reported, so a
    /// panicking stage never leaves the others running unobserved.
    pub async fn join(self) -> Result<PipelineReport, JoinError> {
        let (cycles, known, delivery) = tokio::join!(self.poller, self.dedup, self.delivery);
        Ok(PipelineReport {
            cycles: cycles?,
            known: known?,
            delivery: delivery?,
        })
    }
}
