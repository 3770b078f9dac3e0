//! RSS 2.0 parser.
//!
//! Use this as the template when adding another [`FeedParser`]: the
//! conversion from the wire type into [`FeedItem`] is a pure function so
//! tests can exercise it without touching the network.

use chrono::{DateTime, Utc};

use super::{FeedItem, FeedParser};
use crate::error::SourceError;

/// Parses RSS 2.0 documents with the [`rss`](::rss) crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RssParser;

impl RssParser {
    pub fn new() -> Self {
        Self
    }

    /// Convert an already-parsed [`rss::Channel`](::rss::Channel) into
    /// [`FeedItem`]s, keeping document order.
    pub fn parse_channel(channel: &::rss::Channel) -> Vec<FeedItem> {
        channel
            .items()
            .iter()
            .map(|item| {
                // Prefer <guid>, fall back to <link>, then empty string.
                let id = item
                    .guid()
                    .map(|g| g.value().trim().to_string())
                    .filter(|g| !g.is_empty())
                    .or_else(|| item.link().map(|l| l.trim().to_string()))
                    .unwrap_or_default();

                // Parse RFC-2822 date; gracefully degrade to None on failure.
                let published = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .map(|dt| dt.with_timezone(&Utc));

                FeedItem {
                    id,
                    title: item.title().unwrap_or("(untitled)").to_string(),
                    description: item.description().unwrap_or_default().to_string(),
                    link: item.link().unwrap_or_default().to_string(),
                    published,
                }
            })
            .collect()
    }
}

impl FeedParser for RssParser {
    fn parse(&self, body: &[u8]) -> Result<Vec<FeedItem>, SourceError> {
        let channel = ::rss::Channel::read_from(body)?;
        Ok(Self::parse_channel(&channel))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_items_in_document_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>First Post</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
      <description>First &lt;b&gt;description&lt;/b&gt;</description>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.com/2</link>
      <guid>guid-2</guid>
      <pubDate>Tue, 02 Jan 2024 12:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

        let items = RssParser::new().parse(xml.as_bytes()).unwrap();

        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, "guid-1");
        assert_eq!(items[0].title, "First Post");
        assert_eq!(items[0].link, "https://example.com/1");
        assert_eq!(items[0].description, "First <b>description</b>");
        assert!(items[0].published.is_some());

        assert_eq!(items[1].id, "guid-2");
        assert_eq!(items[1].title, "Second Post");
        assert_eq!(items[1].description, "");
    }

    #[test]
    fn falls_back_to_link_when_no_guid() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <title>No GUID</title>
      <link>https://example.com/no-guid</link>
    </item>
  </channel>
</rss>"#;

        let items = RssParser::new().parse(xml.as_bytes()).unwrap();

        assert_eq!(items[0].id, "https://example.com/no-guid");
    }

    #[test]
    fn item_without_guid_or_link_has_no_identifier() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <title>Anonymous</title>
    </item>
  </channel>
</rss>"#;

        let items = RssParser::new().parse(xml.as_bytes()).unwrap();

        assert_eq!(items.len(), 1);
        assert!(!items[0].has_identifier());
        assert_eq!(items[0].link, "");
    }

    #[test]
    fn handles_missing_title() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <guid>g1</guid>
    </item>
  </channel>
</rss>"#;

        let items = RssParser::new().parse(xml.as_bytes()).unwrap();

        assert_eq!(items[0].title, "(untitled)");
    }

    #[test]
    fn handles_invalid_date() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <guid>g1</guid>
      <title>Bad Date</title>
      <pubDate>not-a-real-date</pubDate>
    </item>
  </channel>
</rss>"#;

        let items = RssParser::new().parse(xml.as_bytes()).unwrap();

        assert!(items[0].published.is_none());
    }

    #[test]
    fn empty_channel_yields_no_items() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Empty</title></channel></rss>"#;

        let items = RssParser::new().parse(xml.as_bytes()).unwrap();

        assert!(items.is_empty());
    }

    #[test]
    fn rejects_documents_that_are_not_rss() {
        let err = RssParser::new()
            .parse(b"<html><body>502 Bad Gateway</body></html>")
            .unwrap_err();

        assert!(matches!(err, SourceError::Parse(_)));
    }
}
