//! Test doubles shared by the stage and pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{NotifyError, SourceError};
use crate::notify::{DeliveryRequest, Notifier, Receipt};
use crate::source::FeedFetcher;

/// Build an RSS document whose items carry the given guids, in order.
pub fn rss_feed(ids: &[&str]) -> Vec<u8> {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                "<item><title>Item {id}</title><link>https://example.com/{id}</link>\
                 <guid>{id}</guid><description>About {id}</description></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test</title>{items}</channel></rss>"#
    )
    .into_bytes()
}

/// Serves a fixed script of responses, one per fetch.  Once the script is
/// exhausted every further fetch fails with HTTP 503.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<u8>, SourceError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Vec<u8>, SourceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SourceError::Status { status: 503 }))
    }
}

/// Records every request it is asked to send.
///
/// Requests whose body contains one of the `fail_on` markers are rejected
/// instead of accepted; they are still recorded.
pub struct RecordingNotifier {
    sent: Mutex<Vec<DeliveryRequest>>,
    fail_on: Vec<String>,
    attempts: watch::Sender<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(markers: &[&str]) -> Self {
        let (attempts, _) = watch::channel(0);
        Self {
            sent: Mutex::new(Vec::new()),
            fail_on: markers.iter().map(|m| m.to_string()).collect(),
            attempts,
        }
    }

    pub fn requests(&self) -> Vec<DeliveryRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` send attempts have been made.
    pub async fn wait_for_attempts(&self, count: usize) {
        let mut rx = self.attempts.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|n| *n >= count))
            .await
            .expect("timed out waiting for deliveries")
            .expect("notifier dropped");
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, request: &DeliveryRequest) -> Result<Receipt, NotifyError> {
        let rejected = self.fail_on.iter().any(|m| request.body.contains(m));
        let index = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(request.clone());
            sent.len()
        };
        self.attempts.send_replace(index);

        if rejected {
            return Err(NotifyError::Rejected {
                status: 400,
                errors: vec!["rejected by test".to_string()],
            });
        }
        Ok(Receipt {
            id: format!("receipt-{index}"),
            remaining: Some(100 - index as u32),
            limit: Some(100),
        })
    }
}
