//! The item type every feed parser produces.
//!
//! `FeedItem` is one entry read from the feed at a point in time.  Parsers
//! convert their native format into `FeedItem`s so the pipeline stages
//! (polling, de-duplication, delivery) stay format-agnostic.

use chrono::{DateTime, Utc};

/// A single feed entry, normalised from the feed's wire format.
///
/// Items are immutable once the parser has produced them; the pipeline only
/// moves or clones them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedItem {
    /// Unique identifier used for de-duplication.
    ///
    /// For RSS this is the `<guid>` element (falling back to `<link>`).  An
    /// empty identifier means the feed gave us nothing stable to key on.
    pub id: String,

    /// Human-readable headline.
    pub title: String,

    /// Longer description or summary.  May contain HTML markup.
    pub description: String,

    /// URL to the full content.  Empty when the feed did not provide one.
    pub link: String,

    /// Publication timestamp, if the feed carried a parseable one.
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Whether the item carries an identifier we can de-duplicate on.
    pub fn has_identifier(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// A [`FeedItem`] annotated with the poll cycle that produced it.
///
/// Cycle `0` is the bootstrap cycle; everything from cycle `1` onwards is a
/// live cycle.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TaggedItem {
    pub cycle: u64,
    pub item: FeedItem,
}

impl TaggedItem {
    pub fn new(cycle: u64, item: FeedItem) -> Self {
        Self { cycle, item }
    }

    pub fn is_bootstrap(&self) -> bool {
        self.cycle == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Shorthand constructor for tests.
    pub fn make_item(id: &str) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            title: format!("Title {id}"),
            description: String::new(),
            link: String::new(),
            published: None,
        }
    }

    #[test]
    fn blank_identifiers_are_not_usable() {
        assert!(make_item("guid-1").has_identifier());
        assert!(!make_item("").has_identifier());
        assert!(!make_item("   ").has_identifier());
    }

    #[test]
    fn only_cycle_zero_is_bootstrap() {
        assert!(TaggedItem::new(0, make_item("a")).is_bootstrap());
        assert!(!TaggedItem::new(1, make_item("a")).is_bootstrap());
        assert!(!TaggedItem::new(42, make_item("a")).is_bootstrap());
    }
}
