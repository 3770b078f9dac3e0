//! Pre-flight checks run before the pipeline starts.
//!
//! A failure here is the one fatal path: the process exits instead of
//! polling a feed it cannot read or notifying with credentials that do not
//! work.

use tracing::info;

use crate::error::StartupError;
use crate::notify::{DeliveryRequest, Notifier};
use crate::source::{self, FeedFetcher, FeedParser};

/// Send the readiness notification, then fetch and parse the feed once.
///
/// Returns how many items the feed currently holds.
pub async fn validate(
    notifier: &dyn Notifier,
    fetcher: &dyn FeedFetcher,
    parser: &dyn FeedParser,
    feed_url: &str,
    notification_title: &str,
) -> Result<usize, StartupError> {
    info!("validating notification credentials");
    let receipt = notifier
        .send(&DeliveryRequest::readiness(notification_title))
        .await
        .map_err(StartupError::Notifier)?;
    info!(
        id = %receipt.id,
        remaining = ?receipt.remaining,
        limit = ?receipt.limit,
        "notification credentials accepted"
    );

    info!(url = feed_url, "validating feed URL");
    let items = source::fetch_items(fetcher, parser, feed_url)
        .await
        .map_err(|source| StartupError::Feed {
            url: feed_url.to_string(),
            source,
        })?;
    info!(items = items.len(), "feed is readable");

    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::RssParser;
    use crate::testing::{rss_feed, RecordingNotifier, ScriptedFetcher};

    const URL: &str = "https://example.com/feed.xml";

    #[tokio::test]
    async fn valid_setup_sends_readiness_message() {
        let notifier = RecordingNotifier::new();
        let fetcher = ScriptedFetcher::new(vec![Ok(rss_feed(&["a", "b"]))]);

        let count = validate(&notifier, &fetcher, &RssParser::new(), URL, "my-feed")
            .await
            .unwrap();

        assert_eq!(count, 2);
        let sent = notifier.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "my-feed is ready to send notifications!");
    }

    #[tokio::test]
    async fn rejected_credentials_abort_before_fetching() {
        let notifier = RecordingNotifier::failing_on(&["ready"]);
        let fetcher = ScriptedFetcher::new(vec![Ok(rss_feed(&["a"]))]);

        let err = validate(&notifier, &fetcher, &RssParser::new(), URL, "my-feed")
            .await
            .unwrap_err();

        assert!(matches!(err, StartupError::Notifier(_)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_feed_is_fatal() {
        let notifier = RecordingNotifier::new();
        let fetcher = ScriptedFetcher::new(vec![Err(SourceError::Status { status: 404 })]);

        let err = validate(&notifier, &fetcher, &RssParser::new(), URL, "my-feed")
            .await
            .unwrap_err();

        match err {
            StartupError::Feed { url, source } => {
                assert_eq!(url, URL);
                assert!(matches!(source, SourceError::Status { status: 404 }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparsable_feed_is_fatal() {
        let notifier = RecordingNotifier::new();
        let fetcher = ScriptedFetcher::new(vec![Ok(b"<html></html>".to_vec())]);

        let err = validate(&notifier, &fetcher, &RssParser::new(), URL, "my-feed")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StartupError::Feed {
                source: SourceError::Parse(_),
                ..
            }
        ));
    }
}
