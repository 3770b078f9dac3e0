//! Delivery of notifications to the external transport.
//!
//! The worker pulls [`DeliveryRequest`]s off the delivery queue and keeps at
//! most `concurrency` sends in flight.  With the default concurrency of one,
//! notifications go out strictly in discovery order; above that, order is
//! not guaranteed.
//!
//! A failed send is logged and dropped.  The item stays known, so it is
//! never announced again.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::notify::{DeliveryRequest, Notifier};
use crate::shutdown::ShutdownListener;

/// Outcome counters for the lifetime of a worker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: u64,
    pub failed: u64,
}

impl DeliveryStats {
    fn record(&mut self, delivered: bool) {
        if delivered {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
    }
}

pub struct DeliveryWorker {
    notifier: Arc<dyn Notifier>,
    concurrency: usize,
}

impl DeliveryWorker {
    pub fn new(notifier: Arc<dyn Notifier>, concurrency: usize) -> Self {
        Self {
            notifier,
            concurrency: concurrency.max(1),
        }
    }

    /// Deliver requests until shutdown fires or the dedup stage goes away.
    ///
    /// Once stopped, sends already in flight are awaited so none are left
    /// running.  Requests still queued are abandoned.
    pub async fn run(
        self,
        mut requests: mpsc::Receiver<DeliveryRequest>,
        mut shutdown: ShutdownListener,
    ) -> DeliveryStats {
        info!(concurrency = self.concurrency, "starting delivery worker");

        let mut stats = DeliveryStats::default();
        let mut in_flight: JoinSet<bool> = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    record_joined(&mut stats, joined);
                }
                request = requests.recv(), if in_flight.len() < self.concurrency => {
                    let Some(request) = request else { break };
                    let notifier = Arc::clone(&self.notifier);
                    in_flight.spawn(async move { deliver(&*notifier, &request).await });
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            record_joined(&mut stats, joined);
        }

        info!(sent = stats.sent, failed = stats.failed, "delivery worker stopped");
        stats
    }
}

/// Send one notification and log the outcome.  Returns whether it was
/// accepted.
async fn deliver(notifier: &dyn Notifier, request: &DeliveryRequest) -> bool {
    match notifier.send(request).await {
        Ok(receipt) => {
            info!(
                id = %receipt.id,
                remaining = ?receipt.remaining,
                limit = ?receipt.limit,
                url = ?request.url,
                "sent notification"
            );
            true
        }
        Err(e) => {
            error!(error = %e, url = ?request.url, "failed to send notification");
            false
        }
    }
}

fn record_joined(stats: &mut DeliveryStats, joined: Result<bool, tokio::task::JoinError>) {
    match joined {
        Ok(delivered) => stats.record(delivered),
        Err(e) => {
            warn!(error = %e, "delivery task did not complete");
            stats.record(false);
        }
    }
}
