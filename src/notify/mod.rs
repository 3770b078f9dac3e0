//! Notification transport abstraction.
//!
//! The pipeline hands [`DeliveryRequest`]s to a [`Notifier`]; the concrete
//! provider (currently Pushover only) lives in a sub-module.

mod pushover;

pub use self::pushover::PushoverClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NotifyError;
use crate::source::FeedItem;

/// One notification, fully formed and ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    /// Notification title, constant per deployment.
    pub title: String,
    /// HTML-flavoured message body.
    pub body: String,
    /// Link attached to the notification, if the item had one.
    pub url: Option<String>,
    /// When the request was created.
    pub timestamp: DateTime<Utc>,
}

impl DeliveryRequest {
    /// Build the notification announcing a newly discovered item.
    pub fn for_item(title: &str, item: &FeedItem) -> Self {
        Self {
            title: title.to_string(),
            body: format!("<b>New item:</b> {}<br>\n{}", item.title, item.description),
            url: Some(item.link.clone()).filter(|link| !link.is_empty()),
            timestamp: Utc::now(),
        }
    }

    /// The message sent once at startup to prove the credentials work.
    pub fn readiness(title: &str) -> Self {
        Self {
            title: title.to_string(),
            body: format!("{title} is ready to send notifications!"),
            url: None,
            timestamp: Utc::now(),
        }
    }
}

/// What the provider reported back for an accepted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Provider-assigned delivery identifier.
    pub id: String,
    /// Messages left in the current quota window, if reported.
    pub remaining: Option<u32>,
    /// Size of the quota window, if reported.
    pub limit: Option<u32>,
}

/// Delivers notifications to a single, pre-configured recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, request: &DeliveryRequest) -> Result<Receipt, NotifyError>;
}
