//! Feed source abstraction layer.
//!
//! Getting items out of a feed is split in two: a [`FeedFetcher`] pulls the
//! raw bytes over the network, a [`FeedParser`] turns those bytes into an
//! ordered list of [`FeedItem`]s.  The poller only talks to the traits, which
//! keeps it testable without a network.
//!
//! ## Adding a new feed format
//!
//! 1. Create a new file in this directory (e.g. `atom.rs`).
//! 2. Define a parser struct and implement [`FeedParser`] for it.
//! 3. Add `mod atom;` below and re-export your struct in the `pub use` block.
//! 4. Construct it in `main.rs` in place of [`RssParser`].

mod feed_item;
mod http;
mod rss;

pub use self::feed_item::{FeedItem, TaggedItem};
pub use self::http::HttpFetcher;
pub use self::rss::RssParser;

use async_trait::async_trait;

use crate::error::SourceError;

/// Retrieves the raw feed document.
///
/// Implementations must be [`Send`] + [`Sync`]: the poller holds them behind
/// an `Arc` on its own task.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Issue a plain GET for `url` and return the response body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Turns a raw feed document into items, preserving document order.
pub trait FeedParser: Send + Sync {
    fn parse(&self, body: &[u8]) -> Result<Vec<FeedItem>, SourceError>;
}

/// Fetch `url` and parse the result in one go.
///
/// Shared by the poller and startup validation so both go through exactly
/// the same path.
pub async fn fetch_items(
    fetcher: &dyn FeedFetcher,
    parser: &dyn FeedParser,
    url: &str,
) -> Result<Vec<FeedItem>, SourceError> {
    let body = fetcher.fetch(url).await?;
    parser.parse(&body)
}
