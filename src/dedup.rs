//! Known-item tracking and new-item detection.
//!
//! The [`DedupCoordinator`] is the only owner of the [`KnownItems`] set, so
//! no locking is involved: exactly one coordinator runs, on its own task.
//!
//! ## Bootstrap
//!
//! Items tagged with cycle `0` only seed the set.  Without that, the first
//! poll after startup would announce every item already in the feed.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::notify::DeliveryRequest;
use crate::shutdown::ShutdownListener;
use crate::source::{FeedItem, TaggedItem};

/// Every identifier observed since startup, with the item first seen for it.
///
/// The set only grows; nothing is ever evicted.
#[derive(Debug, Default, Clone)]
pub struct KnownItems {
    items: HashMap<String, FeedItem>,
}

impl KnownItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Record `item` unless its identifier is already known.  Returns
    /// whether it was inserted.
    fn insert(&mut self, item: FeedItem) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        self.items.insert(item.id.clone(), item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Known identifiers, sorted for stable output.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.items.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

pub struct DedupCoordinator {
    known: KnownItems,
    notification_title: String,
}

impl DedupCoordinator {
    pub fn new(notification_title: impl Into<String>) -> Self {
        Self {
            known: KnownItems::new(),
            notification_title: notification_title.into(),
        }
    }

    /// Classify one tagged item.  Returns the delivery request to send if
    /// the item is new.
    ///
    /// The item is recorded before the request is returned, so a repeat of
    /// the same identifier later in the same cycle is already a duplicate.
    pub fn observe(&mut self, tagged: TaggedItem) -> Option<DeliveryRequest> {
        let bootstrap = tagged.is_bootstrap();
        let TaggedItem { cycle, item } = tagged;

        if !item.has_identifier() {
            warn!(cycle, title = %item.title, link = %item.link, "skipping item without identifier");
            return None;
        }

        if bootstrap {
            let id = item.id.clone();
            if self.known.insert(item) {
                trace!(id = %id, "seeded known item");
            }
            return None;
        }

        if self.known.contains(&item.id) {
            return None;
        }

        info!(
            cycle,
            id = %item.id,
            title = %item.title,
            published = ?item.published,
            "new item found"
        );
        let request = DeliveryRequest::for_item(&self.notification_title, &item);
        self.known.insert(item);
        Some(request)
    }

    /// Consume tagged items until shutdown fires or the poller goes away,
    /// forwarding a delivery request for every new item.
    ///
    /// The delivery queue is bounded: when it is full this stage waits for
    /// room, or for shutdown.  Items still queued on `items` at shutdown are
    /// abandoned.  Returns the final known-item set.
    pub async fn run(
        mut self,
        mut items: mpsc::Receiver<TaggedItem>,
        deliveries: mpsc::Sender<DeliveryRequest>,
        mut shutdown: ShutdownListener,
    ) -> KnownItems {
        info!("starting dedup coordinator");

        loop {
            let tagged = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                tagged = items.recv() => match tagged {
                    Some(tagged) => tagged,
                    None => {
                        debug!("poller is gone, stopping dedup coordinator");
                        break;
                    }
                },
            };

            let Some(request) = self.observe(tagged) else {
                continue;
            };

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                sent = deliveries.send(request) => {
                    if sent.is_err() {
                        debug!("delivery worker is gone, stopping dedup coordinator");
                        break;
                    }
                }
            }
        }

        info!(known = self.known.len(), "dedup coordinator stopped");
        self.known
    }
}
